//! Blocking SPMC broadcast consumer.
//!
//! Behaviorally identical to the blocking SPSC consumer, parameterized by
//! its index into the header's consumer-cell array. Each consumer is
//! independent: one falling behind stalls the producer (unless disabled)
//! but never affects another consumer's view of the stream.

use std::path::Path;

use crate::constants::DISABLED_CONSUMER;
use crate::error::{ Result, RingError };
use crate::message::RingMessage;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

use super::ring::{ self, RingLayout };

/// One consumer's view of a blocking SPMC broadcast ring.
pub struct BroadcastConsumer<T: RingMessage + Default> {
    region: SharedRegion,
    layout: RingLayout,
    producer_cell: SequenceCell,
    consumer_cell: SequenceCell,
    last_fetched: u64,
    unacknowledged: u64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: RingMessage + Default> BroadcastConsumer<T> {
    /// Join an existing broadcast ring as consumer `index` (`0..number_of_consumers`).
    ///
    /// At least one of `capacity`/`number_of_consumers` must be supplied;
    /// the other is inferred from file length.
    pub fn open<P: AsRef<Path>>(
        path: P,
        index: u64,
        capacity: Option<u64>,
        number_of_consumers: Option<u64>,
        max_message_size: usize
    ) -> Result<Self> {
        let (region, layout) = ring::open(path, capacity, number_of_consumers, max_message_size)?;
        if index >= layout.number_of_consumers {
            return Err(
                RingError::invalid_argument(
                    format!("consumer index {index} out of range for {} consumers", layout.number_of_consumers)
                )
            );
        }
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
        let consumer_cell = ring::consumer_cell(&region, index);
        let last_fetched = consumer_cell.load_acquire();
        tracing::debug!(index, capacity = layout.capacity, "broadcast consumer joined");
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

    /// Decode the next unfetched message.
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

    /// Undo the last `n` unacknowledged fetches.
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

    /// Escape hatch: take this consumer out of the producer's gating
    /// computation by storing the disabled sentinel in its cell.
    pub fn disable(&mut self) {
        self.consumer_cell.store_release(DISABLED_CONSUMER as u64);
    }

    /// Re-enable a disabled consumer at its last acknowledged sequence.
    pub fn enable(&mut self) {
        self.consumer_cell.store_release(self.last_fetched);
    }

    /// Last sequence published to this consumer's cell (debug/metrics
    /// accessor; does not include unacknowledged in-flight fetches).
    pub fn fetch_sequence(&self) -> u64 {
        self.last_fetched
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::producer::BroadcastProducer;
    use crate::message::BytesMessage;
    use tempfile::tempdir;

    type Msg = BytesMessage<32>;

    #[test]
    fn each_consumer_sees_every_message_independently() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        let mut producer = BroadcastProducer::<Msg>::create(&path, 8, 3, Msg::max_size()).unwrap();
        for i in 0..5u8 {
            *producer.next_to_dispatch().unwrap() = Msg::new(&[i]);
        }
        producer.flush();

        for index in 0..3 {
            let mut consumer = BroadcastConsumer::<Msg>::open(&path, index, Some(8), None, Msg::max_size()).unwrap();
            let mut seen = Vec::new();
            while let Some(msg) = consumer.fetch(true) {
                seen.push(msg.as_slice()[0]);
            }
            consumer.done_fetching();
            assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn disabling_removes_gating_pressure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ring");
        let producer = BroadcastProducer::<Msg>::create(&path, 4, 2, Msg::max_size()).unwrap();
        producer.close(false).unwrap();

        let mut consumer = BroadcastConsumer::<Msg>::open(&path, 0, Some(4), None, Msg::max_size()).unwrap();
        consumer.disable();
        consumer.enable();
        assert_eq!(consumer.available_to_fetch(), 0);
    }
}
