//! Header layout and open/create protocol for the blocking SPMC broadcast
//! ring.
//!
//! One producer cell followed by `N` consumer cells, each 64 bytes; no
//! persisted capacity pair (same file-length inference as the non-blocking
//! header), but here either `capacity` or `number_of_consumers` alone is
//! enough to recover both from `file_length`.

use std::path::Path;

use crate::constants::MAGIC;
use crate::error::{ Result, RingError };
use crate::index::IndexStrategy;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 8;
const VERSION: u32 = 1;
const CELL_SIZE: u64 = 64;

#[derive(Clone, Copy)]
pub(crate) struct RingLayout {
    pub capacity: u64,
    pub number_of_consumers: u64,
    pub max_message_size: usize,
    pub header_size: usize,
    pub index: IndexStrategy,
}

impl RingLayout {
    pub(crate) fn slot_size(&self) -> usize {
        self.max_message_size
    }

    pub(crate) fn slot_offset(&self, seq: u64) -> usize {
        self.header_size + (self.index.index_of(seq) as usize) * self.slot_size()
    }
}

fn header_size(number_of_consumers: u64) -> u64 {
    CELL_SIZE * (1 + number_of_consumers)
}

fn required_size(capacity: u64, number_of_consumers: u64, max_message_size: usize) -> u64 {
    header_size(number_of_consumers) + capacity * (max_message_size as u64)
}

pub(crate) fn producer_cell(region: &SharedRegion) -> SequenceCell {
    unsafe { SequenceCell::at(region.pointer()) }
}

pub(crate) fn consumer_cell(region: &SharedRegion, index: u64) -> SequenceCell {
    let offset = CELL_SIZE * (1 + index);
    unsafe { SequenceCell::at(region.pointer().add(offset as usize)) }
}

pub(crate) fn create<P: AsRef<Path>>(
    path: P,
    capacity: u64,
    number_of_consumers: u64,
    max_message_size: usize
) -> Result<(SharedRegion, RingLayout)> {
    if capacity == 0 {
        return Err(RingError::invalid_argument("capacity must be positive"));
    }
    if number_of_consumers == 0 {
        return Err(RingError::invalid_argument("number_of_consumers must be positive"));
    }
    if max_message_size == 0 {
        return Err(RingError::invalid_argument("max_message_size must be positive"));
    }

    let size = required_size(capacity, number_of_consumers, max_message_size);
    let mut region = SharedRegion::create(path, size)?;
    region.put_u64(MAGIC_OFFSET, MAGIC);
    region.put_u32(VERSION_OFFSET, VERSION);

    producer_cell(&region).init(0);
    for i in 0..number_of_consumers {
        consumer_cell(&region, i).init(0);
    }

    let layout = RingLayout {
        capacity,
        number_of_consumers,
        max_message_size,
        header_size: header_size(number_of_consumers) as usize,
        index: IndexStrategy::for_capacity(capacity),
    };
    Ok((region, layout))
}

/// Join an existing broadcast ring. At least one of `capacity` or
/// `number_of_consumers` must be supplied; the other is inferred from
/// `file_length` when absent.
pub(crate) fn open<P: AsRef<Path>>(
    path: P,
    capacity: Option<u64>,
    number_of_consumers: Option<u64>,
    max_message_size: usize
) -> Result<(SharedRegion, RingLayout)> {
    if capacity.is_none() && number_of_consumers.is_none() {
        return Err(
            RingError::invalid_argument("at least one of capacity or number_of_consumers must be supplied")
        );
    }
    if max_message_size == 0 {
        return Err(RingError::invalid_argument("max_message_size must be positive"));
    }

    let path = path.as_ref();
    if !path.exists() {
        return Err(RingError::file_not_found(path.display().to_string()));
    }
    let region = SharedRegion::open(path, None)?;
    let file_length = region.len() as u64;

    let magic = region.get_u64(MAGIC_OFFSET);
    if magic != MAGIC {
        return Err(RingError::config_mismatch("magic", MAGIC, magic));
    }

    let (capacity, number_of_consumers) = match (capacity, number_of_consumers) {
        (Some(c), Some(n)) => (c, n),
        (Some(c), None) => {
            let implied_header = file_length.saturating_sub(c * (max_message_size as u64));
            if implied_header % CELL_SIZE != 0 || implied_header < CELL_SIZE {
                return Err(
                    RingError::config_mismatch("file_length", "consistent with capacity", file_length)
                );
            }
            (c, implied_header / CELL_SIZE - 1)
        }
        (None, Some(n)) => {
            let header = header_size(n);
            if file_length < header {
                return Err(RingError::config_mismatch("file_length", format!(">= {header}"), file_length));
            }
            let data_bytes = file_length - header;
            let slot_size = max_message_size as u64;
            if data_bytes % slot_size != 0 {
                return Err(
                    RingError::config_mismatch("file_length", "multiple of slot_size after header", file_length)
                );
            }
            (data_bytes / slot_size, n)
        }
        (None, None) => unreachable!("checked above"),
    };

    if capacity == 0 || number_of_consumers == 0 {
        return Err(RingError::invalid_argument("inferred capacity or number_of_consumers is zero"));
    }

    let expected_len = required_size(capacity, number_of_consumers, max_message_size);
    if file_length != expected_len {
        return Err(RingError::config_mismatch("file_length", expected_len, file_length));
    }

    let layout = RingLayout {
        capacity,
        number_of_consumers,
        max_message_size,
        header_size: header_size(number_of_consumers) as usize,
        index: IndexStrategy::for_capacity(capacity),
    };
    Ok((region, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_open_with_consumer_count_infers_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        create(&path, 16, 3, 32).unwrap();

        let (_, layout) = open(&path, None, Some(3), 32).unwrap();
        assert_eq!(layout.capacity, 16);
        assert_eq!(layout.number_of_consumers, 3);
    }

    #[test]
    fn create_then_open_with_capacity_infers_consumer_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        create(&path, 16, 3, 32).unwrap();

        let (_, layout) = open(&path, Some(16), None, 32).unwrap();
        assert_eq!(layout.number_of_consumers, 3);
    }

    #[test]
    fn open_requires_at_least_one_hint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        create(&path, 16, 3, 32).unwrap();

        assert!(open(&path, None, None, 32).is_err());
    }
}
