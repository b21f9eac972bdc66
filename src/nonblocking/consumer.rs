//! Non-blocking SPSC consumer.
//!
//! There is no consumer sequence cell in this variant's header — `last_fetched`
//! is purely local bookkeeping, never published. Wrap detection instead
//! compares how far behind the consumer is against `effective_fall_behind_capacity`;
//! falling further behind than that means the producer may already have
//! overwritten slots this consumer has not read yet.
//!
//! On a checksum mismatch the checksum is verified before mutating any
//! local state, so "consumer state unchanged on failure" holds identically
//! on both the peek and remove paths.

use std::path::Path;

use crate::error::{ Result, RingError };
use crate::hash::checksum_of;
use crate::message::RingMessage;
use crate::sequence::SequenceCell;
use crate::shared_memory::SharedRegion;

use super::ring::{ self, RingLayout };

/// Sentinel `available_to_fetch` return meaning "the producer has wrapped
/// past this consumer".
pub const WRAPPED: i64 = -1;

/// Consumer side of a non-blocking (overwriting) SPSC ring.
pub struct NonBlockingConsumer<T: RingMessage + Default> {
    region: SharedRegion,
    layout: RingLayout,
    producer_cell: SequenceCell,
    last_fetched: u64,
    fall_behind_tolerance: f64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: RingMessage + Default> NonBlockingConsumer<T> {
    /// Attach to an existing ring file at `path`.
    ///
    /// `max_message_size` and `checksum_enabled` must match what the
    /// producer was created with; `capacity` of `None` infers it from file
    /// length. `fall_behind_tolerance` is ignored when `checksum_enabled`
    /// is `true` (see [`Self::effective_fall_behind_capacity`]).
    pub fn open<P: AsRef<Path>>(
        path: P,
        capacity: Option<u64>,
        max_message_size: usize,
        checksum_enabled: bool,
        fall_behind_tolerance: f64
    ) -> Result<Self> {
        if fall_behind_tolerance <= 0.0 || fall_behind_tolerance > 1.0 {
            return Err(
                RingError::invalid_argument("fall_behind_tolerance must be in (0.0, 1.0]")
            );
        }
        let (region, layout) = ring::open(path, capacity, max_message_size, checksum_enabled)?;
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
        tracing::debug!(capacity = layout.capacity, checksum_enabled, "non-blocking consumer attached");
        Ok(Self {
            region,
            layout,
            producer_cell,
            last_fetched: 0,
            fall_behind_tolerance,
            _marker: std::marker::PhantomData,
        })
    }

    /// `round(capacity * fall_behind_tolerance)`, clamped to at least 1;
    /// exactly `capacity` when tolerance is `1.0` or checksum is enabled.
    pub fn effective_fall_behind_capacity(&self) -> u64 {
        if self.layout.checksum_enabled || self.fall_behind_tolerance >= 1.0 {
            return self.layout.capacity;
        }
        let scaled = (self.layout.capacity as f64) * self.fall_behind_tolerance;
        (scaled.round() as u64).max(1)
    }

    /// Messages available to fetch, or [`WRAPPED`] if the producer has
    /// overtaken this consumer by more than its tolerance margin.
    pub fn available_to_fetch(&self) -> i64 {
        let offer = self.producer_cell.load_acquire();
        let avail = offer.saturating_sub(self.last_fetched);
        if avail > self.effective_fall_behind_capacity() {
            return WRAPPED;
        }
        avail as i64
    }

    /// Decode the next unfetched message.
    ///
    /// Returns `None` when nothing new has been published, or when the
    /// stored checksum does not match the recomputed one (checksum mode
    /// only) — in both cases consumer state is left unchanged. If `remove`
    /// is `true` and decoding succeeds, `last_fetched` advances.
    pub fn fetch(&mut self, remove: bool) -> Option<T> {
        let offer = self.producer_cell.load_acquire();
        let seq = self.last_fetched + 1;
        if seq > offer {
            return None;
        }

        let offset = self.layout.slot_offset(seq);
        let slot_size = self.layout.slot_size();
        let slot = self.region.slice(offset, slot_size);

        let payload = if self.layout.checksum_enabled {
            let stored_checksum = u64::from_le_bytes(slot[0..8].try_into().unwrap());
            let payload = &slot[8..];
            let (_, consumed) = T::read(payload);
            let recomputed = checksum_of(seq, &payload[..consumed]);
            if recomputed != stored_checksum {
                tracing::warn!(seq, stored_checksum, recomputed, "checksum mismatch, discarding fetch");
                return None;
            }
            payload
        } else {
            slot
        };

        let (message, _) = T::read(payload);
        if remove {
            self.last_fetched = seq;
        }
        Some(message)
    }

    /// No-op: the non-blocking variant has no consumer sequence to publish.
    pub fn done_fetching(&self) {}

    /// Ring capacity.
    pub fn capacity(&self) -> u64 {
        self.layout.capacity
    }

    /// Unmap the region, optionally deleting the backing file.
    pub fn close(self, delete_file: bool) -> Result<()> {
        self.region.release(delete_file)
    }
}
