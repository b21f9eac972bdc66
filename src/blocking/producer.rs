//! Blocking SPSC producer.
//!
//! Claim a slot only once the consumer has acknowledged enough space, batch
//! several claims, publish them all with a single release-store.

use std::path::Path;

use crate::error::Result;
use crate::message::RingMessage;
use crate::pool::Pool;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

use super::ring::{ self, RingLayout };

/// Producer side of a blocking SPSC ring.
///
/// `next_to_dispatch` blocks logically (returns `None`) rather than
/// overwriting unconsumed data; callers busy-spin on `None` — there is no
/// internal sleep or futex wait.
pub struct BlockingProducer<T: RingMessage + Default> {
    region: SharedRegion,
    layout: RingLayout,
    producer_cell: SequenceCell,
    consumer_cell: SequenceCell,
    last_offered: u64,
    max_seq_before_wrapping: u64,
    pending: Pool<T>,
    pending_start: u64,
}

impl<T: RingMessage + Default> BlockingProducer<T> {
    /// Create a new ring file at `path` and return its producer handle.
    pub fn create<P: AsRef<Path>>(path: P, capacity: u64, max_message_size: usize) -> Result<Self> {
        assert!(
            T::max_size() <= max_message_size,
            "max_message_size ({max_message_size}) is smaller than T::max_size() ({})",
            T::max_size()
        );
        let (region, layout) = ring::create(path, capacity, max_message_size)?;
        let producer_cell = ring::producer_cell(&region);
        let consumer_cell = ring::consumer_cell(&region);
        let pending = Pool::new(capacity as usize);
        tracing::debug!(capacity, max_message_size, "blocking producer created");
        Ok(Self {
            region,
            layout,
            producer_cell,
            consumer_cell,
            last_offered: 0,
            max_seq_before_wrapping: capacity,
            pending,
            pending_start: 1,
        })
    }

    /// Claim the next message slot for writing.
    ///
    /// Returns `None` when the ring is full (the consumer has not yet
    /// acknowledged enough space) or when the producer's own pending batch
    /// has already reached ring capacity; the caller must `flush` first.
    pub fn next_to_dispatch(&mut self) -> Option<&mut T> {
        let next = self.last_offered + 1;
        if next > self.max_seq_before_wrapping {
            let fetched = self.consumer_cell.load_acquire();
            self.max_seq_before_wrapping = fetched + self.layout.capacity;
            if next > self.max_seq_before_wrapping {
                return None;
            }
        }

        if self.pending.in_flight() == 0 {
            self.pending_start = next;
        }
        let slot = self.pending.checkout()?;
        self.last_offered = next;
        Some(slot)
    }

    /// Serialize every pending message into its slot and publish the new
    /// offer sequence with a single release-store.
    pub fn flush(&mut self) {
        let in_flight = self.pending.in_flight();
        for i in 0..in_flight {
            let seq = self.pending_start + (i as u64);
            let offset = self.layout.slot_offset(seq);
            let slot = self.region.slice_mut(offset, self.layout.slot_size());
            self.pending.get(i).write(slot);
        }
        if in_flight > 0 {
            self.producer_cell.store_release(self.last_offered);
            self.pending.release_all();
        }
    }

    /// Current published offer sequence (debug/metrics accessor).
    pub fn offer_sequence(&self) -> u64 {
        self.producer_cell.load_relaxed()
    }

    /// Ring capacity.
    pub fn capacity(&self) -> u64 {
        self.layout.capacity
    }

    /// Unmap the region, optionally deleting the backing file.
    pub fn close(self, delete_file: bool) -> Result<()> {
        self.region.release(delete_file)
    }
}
