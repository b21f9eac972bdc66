//! Non-blocking SPSC producer.
//!
//! Same claim/flush shape as the blocking producer but without ever
//! consulting a consumer cell: `next_to_dispatch` always succeeds and the
//! producer freely overwrites slots a lagging consumer has not finished
//! reading. The claim batch itself stays bounded by ring capacity (the same
//! pool sizing the blocking producer uses) — that bound is a batching
//! convenience, not the "never blocks" property, which is about consumer
//! lag, not same-flush batch size.

use std::path::Path;

use crate::error::Result;
use crate::hash::checksum_of;
use crate::message::RingMessage;
use crate::pool::Pool;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

use super::ring::{ self, RingLayout };

/// Producer side of a non-blocking (overwriting) SPSC ring.
pub struct NonBlockingProducer<T: RingMessage + Default> {
    region: SharedRegion,
    layout: RingLayout,
    producer_cell: SequenceCell,
    last_offered: u64,
    pending: Pool<T>,
    pending_start: u64,
}

impl<T: RingMessage + Default> NonBlockingProducer<T> {
    /// Create a new ring file at `path`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        capacity: u64,
        max_message_size: usize,
        checksum_enabled: bool
    ) -> Result<Self> {
        assert!(
            T::max_size() <= max_message_size,
            "max_message_size ({max_message_size}) is smaller than T::max_size() ({})",
            T::max_size()
        );
        let (region, layout) = ring::create(path, capacity, max_message_size, checksum_enabled)?;
        let producer_cell = ring::producer_cell(&region);
        let pending = Pool::new(capacity as usize);
        tracing::debug!(capacity, max_message_size, checksum_enabled, "non-blocking producer created");
        Ok(Self {
            region,
            layout,
            producer_cell,
            last_offered: 0,
            pending,
            pending_start: 1,
        })
    }

    /// Claim the next message slot for writing. Always succeeds.
    pub fn next_to_dispatch(&mut self) -> &mut T {
        if self.pending.in_flight() as u64 >= self.layout.capacity {
            // Caller batched more claims than ring capacity without
            // flushing. Flush the current batch under its own (already
            // valid) last_offered/pending_start before claiming anything
            // new — last_offered must never advance past a sequence whose
            // slot hasn't actually been checked out and written yet, or a
            // consumer could observe an offer sequence for a slot still
            // holding its previous occupant's bytes.
            self.flush();
        }
        let next = self.last_offered + 1;
        if self.pending.in_flight() == 0 {
            self.pending_start = next;
        }
        self.last_offered = next;
        self.pending.checkout().expect("pool has room after flush")
    }

    /// Serialize every pending message into its slot (writing a checksum
    /// prefix first if enabled) and publish the new offer sequence.
    pub fn flush(&mut self) {
        let in_flight = self.pending.in_flight();
        for i in 0..in_flight {
            let seq = self.pending_start + (i as u64);
            let offset = self.layout.slot_offset(seq);
            let slot_size = self.layout.slot_size();
            let message = self.pending.get(i);

            if self.layout.checksum_enabled {
                let mut payload = vec![0u8; self.layout.max_message_size];
                let written = message.write(&mut payload);
                let checksum = checksum_of(seq, &payload[..written]);
                let slot = self.region.slice_mut(offset, slot_size);
                slot[0..8].copy_from_slice(&checksum.to_le_bytes());
                slot[8..8 + written].copy_from_slice(&payload[..written]);
            } else {
                let slot = self.region.slice_mut(offset, slot_size);
                message.write(slot);
            }
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
