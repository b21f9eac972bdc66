//! Header layout and open/create protocol for the non-blocking SPSC ring.
//!
//! Unlike the blocking ring, there is no consumer cell and no persisted
//! capacity pair — capacity is inferred from file length.
//! `max_message_size` and `checksum_enabled` are not persisted either since
//! they determine `slot_size`, which is needed to do that inference; both
//! participants must agree on them out of band.

use std::path::Path;

use crate::constants::{ CHECKSUM_SIZE, MAGIC };
use crate::error::{ Result, RingError };
use crate::index::IndexStrategy;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

pub(crate) const PRODUCER_CELL_OFFSET: usize = 0;
pub(crate) const HEADER_SIZE: usize = 64;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 8;
const VERSION: u32 = 1;

#[derive(Clone, Copy)]
pub(crate) struct RingLayout {
    pub capacity: u64,
    pub max_message_size: usize,
    pub checksum_enabled: bool,
    pub header_size: usize,
    pub index: IndexStrategy,
}

impl RingLayout {
    pub(crate) fn slot_size(&self) -> usize {
        if self.checksum_enabled {
            CHECKSUM_SIZE + self.max_message_size
        } else {
            self.max_message_size
        }
    }

    pub(crate) fn slot_offset(&self, seq: u64) -> usize {
        self.header_size + (self.index.index_of(seq) as usize) * self.slot_size()
    }
}

fn slot_size_for(max_message_size: usize, checksum_enabled: bool) -> usize {
    if checksum_enabled { CHECKSUM_SIZE + max_message_size } else { max_message_size }
}

fn required_size(capacity: u64, slot_size: usize) -> u64 {
    HEADER_SIZE as u64 + capacity * (slot_size as u64)
}

fn validate_params(max_message_size: usize) -> Result<()> {
    if max_message_size == 0 {
        return Err(RingError::invalid_argument("max_message_size must be positive"));
    }
    Ok(())
}

pub(crate) fn producer_cell(region: &SharedRegion) -> SequenceCell {
    unsafe { SequenceCell::at(region.pointer().add(PRODUCER_CELL_OFFSET)) }
}

pub(crate) fn create<P: AsRef<Path>>(
    path: P,
    capacity: u64,
    max_message_size: usize,
    checksum_enabled: bool
) -> Result<(SharedRegion, RingLayout)> {
    if capacity == 0 {
        return Err(RingError::invalid_argument("capacity must be positive"));
    }
    validate_params(max_message_size)?;
    let slot_size = slot_size_for(max_message_size, checksum_enabled);
    let size = required_size(capacity, slot_size);
    let mut region = SharedRegion::create(path, size)?;

    region.put_u64(MAGIC_OFFSET, MAGIC);
    region.put_u32(VERSION_OFFSET, VERSION);
    producer_cell(&region).init(0);

    let layout = RingLayout {
        capacity,
        max_message_size,
        checksum_enabled,
        header_size: HEADER_SIZE,
        index: IndexStrategy::for_capacity(capacity),
    };
    Ok((region, layout))
}

pub(crate) fn open<P: AsRef<Path>>(
    path: P,
    capacity: Option<u64>,
    max_message_size: usize,
    checksum_enabled: bool
) -> Result<(SharedRegion, RingLayout)> {
    validate_params(max_message_size)?;
    let path = path.as_ref();
    if !path.exists() {
        return Err(RingError::file_not_found(path.display().to_string()));
    }

    let region = SharedRegion::open(path, None)?;
    if region.len() < HEADER_SIZE {
        return Err(
            RingError::config_mismatch("file_length", format!(">= {HEADER_SIZE}"), region.len())
        );
    }
    let magic = region.get_u64(MAGIC_OFFSET);
    if magic != MAGIC {
        return Err(RingError::config_mismatch("magic", MAGIC, magic));
    }

    let slot_size = slot_size_for(max_message_size, checksum_enabled);
    let data_bytes = (region.len() as u64) - (HEADER_SIZE as u64);
    let inferred_capacity = data_bytes / (slot_size as u64);

    let capacity = match capacity {
        Some(c) if c != inferred_capacity => {
            return Err(RingError::config_mismatch("capacity", c, inferred_capacity));
        }
        Some(c) => c,
        None => inferred_capacity,
    };
    if capacity == 0 {
        return Err(RingError::invalid_argument("inferred capacity is zero"));
    }
    if data_bytes % (slot_size as u64) != 0 {
        return Err(
            RingError::config_mismatch(
                "file_length",
                format!("multiple of slot_size ({slot_size}) plus header"),
                region.len()
            )
        );
    }

    let layout = RingLayout {
        capacity,
        max_message_size,
        checksum_enabled,
        header_size: HEADER_SIZE,
        index: IndexStrategy::for_capacity(capacity),
    };
    Ok((region, layout))
}
