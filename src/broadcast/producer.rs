//! Blocking SPMC broadcast producer.
//!
//! Identical claim/flush discipline to the blocking SPSC producer, except
//! the wrapping bound is gated by the *slowest active* consumer rather than
//! the single consumer, generalized from "all consumers" to "all consumers
//! not disabled".

use std::path::Path;

use crate::constants::DISABLED_CONSUMER;
use crate::error::Result;
use crate::message::RingMessage;
use crate::pool::Pool;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

use super::ring::{ self, RingLayout };

/// Producer side of a blocking SPMC broadcast ring. All consumers observe
/// every message in the same order; a slow (non-disabled) consumer stalls
/// the producer exactly as in the SPSC case.
pub struct BroadcastProducer<T: RingMessage + Default> {
    region: SharedRegion,
    layout: RingLayout,
    producer_cell: SequenceCell,
    consumer_cells: Vec<SequenceCell>,
    last_offered: u64,
    max_seq_before_wrapping: u64,
    pending: Pool<T>,
    pending_start: u64,
}

impl<T: RingMessage + Default> BroadcastProducer<T> {
    /// Create a new ring file at `path` with `number_of_consumers` consumer
    /// slots, all initially active.
    pub fn create<P: AsRef<Path>>(
        path: P,
        capacity: u64,
        number_of_consumers: u64,
        max_message_size: usize
    ) -> Result<Self> {
        assert!(
            T::max_size() <= max_message_size,
            "max_message_size ({max_message_size}) is smaller than T::max_size() ({})",
            T::max_size()
        );
        let (region, layout) = ring::create(path, capacity, number_of_consumers, max_message_size)?;
        let producer_cell = ring::producer_cell(&region);
        let consumer_cells = (0..number_of_consumers).map(|i| ring::consumer_cell(&region, i)).collect();
        let pending = Pool::new(capacity as usize);
        tracing::debug!(capacity, number_of_consumers, "broadcast producer created");
        Ok(Self {
            region,
            layout,
            producer_cell,
            consumer_cells,
            last_offered: 0,
            max_seq_before_wrapping: capacity,
            pending,
            pending_start: 1,
        })
    }

    fn min_active_fetch_sequence(&self) -> Option<u64> {
        self.consumer_cells
            .iter()
            .map(|cell| cell.load_acquire())
            .filter(|&seq| seq != (DISABLED_CONSUMER as u64))
            .min()
    }

    /// Claim the next message slot for writing.
    ///
    /// Returns `None` when the slowest active consumer has not yet
    /// acknowledged enough space. If every consumer is disabled, the
    /// producer is unbounded.
    pub fn next_to_dispatch(&mut self) -> Option<&mut T> {
        let next = self.last_offered + 1;
        if next > self.max_seq_before_wrapping {
            self.max_seq_before_wrapping = match self.min_active_fetch_sequence() {
                Some(min_fetched) => min_fetched + self.layout.capacity,
                None => u64::MAX,
            };
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

    /// Serialize every pending message and publish the new offer sequence.
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

    /// Number of consumer slots (including disabled ones).
    pub fn number_of_consumers(&self) -> u64 {
        self.layout.number_of_consumers
    }

    /// Unmap the region, optionally deleting the backing file.
    pub fn close(self, delete_file: bool) -> Result<()> {
        self.region.release(delete_file)
    }
}
