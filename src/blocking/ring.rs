//! Header layout and open/create protocol for the blocking SPSC ring.
//!
//! Producer creates, consumer attaches, a magic number guards against
//! opening a foreign or stale file.

use std::path::Path;

use crate::constants::MAGIC;
use crate::error::{ Result, RingError };
use crate::index::IndexStrategy;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

pub(crate) const PRODUCER_CELL_OFFSET: usize = 0;
pub(crate) const CONSUMER_CELL_OFFSET: usize = 64;
pub(crate) const CAPACITY_FIELD_OFFSET: usize = 128;
pub(crate) const MAX_MESSAGE_SIZE_FIELD_OFFSET: usize = 132;
pub(crate) const HEADER_SIZE: usize = 136;

// The magic/version pair lives in the otherwise-unused leading padding of
// the producer cell (bytes 0..8 and 8..12 of the 24 pad bytes before the
// sequence at byte 24).
const MAGIC_OFFSET: usize = 0;
const VERSION_OFFSET: usize = 8;
const VERSION: u32 = 1;

/// Resolved geometry of an open blocking ring.
#[derive(Clone, Copy)]
pub(crate) struct RingLayout {
    pub capacity: u64,
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

fn required_size(capacity: u64, max_message_size: usize) -> u64 {
    HEADER_SIZE as u64 + capacity * (max_message_size as u64)
}

fn validate_params(capacity: u64, max_message_size: usize) -> Result<()> {
    if capacity == 0 {
        return Err(RingError::invalid_argument("capacity must be positive"));
    }
    if max_message_size == 0 {
        return Err(RingError::invalid_argument("max_message_size must be positive"));
    }
    Ok(())
}

pub(crate) fn producer_cell(region: &SharedRegion) -> SequenceCell {
    unsafe { SequenceCell::at(region.pointer().add(PRODUCER_CELL_OFFSET)) }
}

pub(crate) fn consumer_cell(region: &SharedRegion) -> SequenceCell {
    unsafe { SequenceCell::at(region.pointer().add(CONSUMER_CELL_OFFSET)) }
}

/// Create a fresh ring file at `path` (producer side).
pub(crate) fn create<P: AsRef<Path>>(
    path: P,
    capacity: u64,
    max_message_size: usize
) -> Result<(SharedRegion, RingLayout)> {
    validate_params(capacity, max_message_size)?;
    let size = required_size(capacity, max_message_size);
    let mut region = SharedRegion::create(path, size)?;

    region.put_u64(MAGIC_OFFSET, MAGIC);
    region.put_u32(VERSION_OFFSET, VERSION);
    producer_cell(&region).init(0);
    consumer_cell(&region).init(0);
    region.put_u32(CAPACITY_FIELD_OFFSET, capacity as u32);
    region.put_u32(MAX_MESSAGE_SIZE_FIELD_OFFSET, max_message_size as u32);

    let layout = RingLayout {
        capacity,
        max_message_size,
        header_size: HEADER_SIZE,
        index: IndexStrategy::for_capacity(capacity),
    };
    Ok((region, layout))
}

/// Attach to an existing ring file at `path` (consumer side).
///
/// `capacity`/`max_message_size` of `None` means "read from the file".
pub(crate) fn open<P: AsRef<Path>>(
    path: P,
    capacity: Option<u64>,
    max_message_size: Option<usize>
) -> Result<(SharedRegion, RingLayout)> {
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

    let persisted_capacity = region.get_u32(CAPACITY_FIELD_OFFSET) as u64;
    let persisted_max_message_size = region.get_u32(MAX_MESSAGE_SIZE_FIELD_OFFSET) as usize;

    let capacity = match capacity {
        Some(c) if c != persisted_capacity => {
            return Err(RingError::config_mismatch("capacity", c, persisted_capacity));
        }
        Some(c) => c,
        None => persisted_capacity,
    };
    let max_message_size = match max_message_size {
        Some(m) if m != persisted_max_message_size => {
            return Err(
                RingError::config_mismatch("max_message_size", m, persisted_max_message_size)
            );
        }
        Some(m) => m,
        None => persisted_max_message_size,
    };
    validate_params(capacity, max_message_size)?;

    let expected_len = required_size(capacity, max_message_size);
    if region.len() as u64 != expected_len {
        return Err(RingError::config_mismatch("file_length", expected_len, region.len()));
    }

    let layout = RingLayout {
        capacity,
        max_message_size,
        header_size: HEADER_SIZE,
        index: IndexStrategy::for_capacity(capacity),
    };
    Ok((region, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_open_infers_params() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        create(&path, 8, 64).unwrap();

        let (_, layout) = open(&path, None, None).unwrap();
        assert_eq!(layout.capacity, 8);
        assert_eq!(layout.max_message_size, 64);
    }

    #[test]
    fn open_rejects_mismatched_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        create(&path, 8, 64).unwrap();

        let result = open(&path, Some(16), None);
        assert!(matches!(result, Err(RingError::ConfigurationMismatch { .. })));
    }

    #[test]
    fn open_missing_file_fails_even_with_explicit_params() {
        let result = open("/nonexistent/ring/path", Some(8), Some(64));
        assert!(matches!(result, Err(RingError::FileNotFound { .. })));
    }

    #[test]
    fn create_rejects_zero_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        assert!(create(&path, 0, 64).is_err());
    }
}
