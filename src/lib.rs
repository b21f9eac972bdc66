//! # ringmmap-ipc
//!
//! Lock-free, allocation-free shared-memory ring buffer transport for
//! inter-process communication.
//!
//! A ring lives entirely inside a memory-mapped file; independent processes
//! that map the same path observe the same bytes. The producer and each
//! consumer exchange only two kinds of messages: the data itself, written
//! with plain memory operations, and a sequence number, published with a
//! release-store and observed with an acquire-load. There is no mutex, no
//! futex, and no condition variable anywhere in this crate — a participant
//! that finds nothing to do busy-spins and retries.
//!
//! ## Architecture
//!
//! ```text
//! Process A (Producer)           Shared Memory            Process B (Consumer)
//! ┌──────────────────┐     ┌───────────────────────┐     ┌──────────────────┐
//! │    Application    │     │  mmap-backed ring file │     │    Application    │
//! │        │          │     │  ┌─┬─┬─┬─┬─┬─┬─┬─┐     │     │        ▲          │
//! │        ▼          │     │  │ │ │█│█│ │ │ │ │     │     │        │          │
//! │  BlockingProducer ─┼─────┼─►│ │ │ │ │ │ │ │ │─────┼─────┼─ BlockingConsumer │
//! │                    │     │  └─┴─┴─┴─┴─┴─┴─┴─┘     │     │                   │
//! └────────────────────┘     └───────────────────────┘     └───────────────────┘
//! ```
//!
//! ## Choosing a variant
//!
//! - [`blocking`]: single producer, single consumer, never drops a message.
//!   The producer busy-spins when the ring is full rather than overwrite
//!   unconsumed data.
//! - [`nonblocking`]: single producer, single consumer, never stalls the
//!   producer. A lagging consumer detects that it has been overtaken
//!   instead, optionally backed by a per-message checksum.
//! - [`broadcast`]: single producer, many consumers, every consumer sees
//!   every message in the same order. A slow consumer stalls the producer
//!   unless explicitly disabled.
//!
//! All three share the same [`RingMessage`] serialization contract and the
//! same underlying [`SharedRegion`] primitive.

pub mod error;

mod constants;
mod hash;
mod index;
mod message;
mod pool;
mod sequence;
mod shared_memory;

pub mod blocking;
pub mod broadcast;
pub mod nonblocking;

pub use error::{ Result, RingError };
pub use message::{ BytesMessage, RingMessage };
pub use pool::Pool;
pub use shared_memory::SharedRegion;
