//! Blocking SPSC consumer.
//!
//! `fetch` decodes a slot without disturbing the published consumer cell,
//! `done_fetching` is the only call that advances it, `roll_back` undoes
//! fetches that were not yet acknowledged.

use std::path::Path;

use crate::error::{ Result, RingError };
use crate::message::RingMessage;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

use super::ring::{ self, RingLayout };

/// Consumer side of a blocking SPSC ring.
pub struct BlockingConsumer<T: RingMessage + Default> {
    region: SharedRegion,
    layout: RingLayout,
    producer_cell: SequenceCell,
    consumer_cell: SequenceCell,
    last_fetched: u64,
    unacknowledged: u64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: RingMessage + Default> BlockingConsumer<T> {
    /// Attach to an existing ring file at `path`.
    ///
    /// `capacity`/`max_message_size` of `None` infers the value from the
    /// file's persisted header.
    pub fn open<P: AsRef<Path>>(
        path: P,
        capacity: Option<u64>,
        max_message_size: Option<usize>
    ) -> Result<Self> {
        let (region, layout) = ring::open(path, capacity, max_message_size)?;
        if T::max_size() > layout.max_message_size {
            return Err(
                RingError::config_mismatch(
                    "max_message_size",
                    format!(">= {}", T::max_size()),
                    layout.max_message_size
                )
            );
        }
        let producer_cell = ring::producer_cell(&region);
        let consumer_cell = ring::consumer_cell(&region);
        let last_fetched = consumer_cell.load_acquire();
        tracing::debug!(capacity = layout.capacity, last_fetched, "blocking consumer attached");
        Ok(Self {
            region,
            layout,
            producer_cell,
            consumer_cell,
            last_fetched,
            unacknowledged: 0,
            _marker: std::marker::PhantomData,
        })
    }

    /// Number of messages published but not yet fetched by this consumer.
    pub fn available_to_fetch(&self) -> u64 {
        let offer = self.producer_cell.load_acquire();
        offer.saturating_sub(self.last_fetched + self.unacknowledged)
    }

    /// Decode the next unfetched message, without publishing acknowledgment.
    ///
    /// Returns `None` if nothing new has been published. If `remove` is
    /// `true`, the message is consumed (repeated calls advance through
    /// successive messages); if `false`, this is a non-destructive peek and
    /// the next call sees the same message again.
    pub fn fetch(&mut self, remove: bool) -> Option<T> {
        let offer = self.producer_cell.load_acquire();
        let seq = self.last_fetched + self.unacknowledged + 1;
        if seq > offer {
            return None;
        }
        let offset = self.layout.slot_offset(seq);
        let bytes = self.region.slice(offset, self.layout.slot_size());
        let (message, _) = T::read(bytes);
        if remove {
            self.unacknowledged += 1;
        }
        Some(message)
    }

    /// Publish acknowledgment of every message fetched since the last call.
    pub fn done_fetching(&mut self) {
        if self.unacknowledged == 0 {
            return;
        }
        self.last_fetched += self.unacknowledged;
        self.unacknowledged = 0;
        self.consumer_cell.store_release(self.last_fetched);
    }

    /// Undo the last `n` unacknowledged fetches, making them fetchable again.
    pub fn roll_back(&mut self, n: u64) -> Result<()> {
        if n > self.unacknowledged {
            return Err(
                RingError::invalid_argument(
                    format!("cannot roll back {n} fetches, only {} unacknowledged", self.unacknowledged)
                )
            );
        }
        self.unacknowledged -= n;
        Ok(())
    }

    /// Ring capacity.
    pub fn capacity(&self) -> u64 {
        self.layout.capacity
    }

    /// Last sequence published to the shared consumer cell (debug/metrics
    /// accessor; does not include unacknowledged in-flight fetches).
    pub fn fetch_sequence(&self) -> u64 {
        self.last_fetched
    }

    /// Unmap the region, optionally deleting the backing file.
    pub fn close(self, delete_file: bool) -> Result<()> {
        self.region.release(delete_file)
    }
}
