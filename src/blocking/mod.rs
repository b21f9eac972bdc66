//! Blocking SPSC ring: a single producer and single consumer, where the
//! producer busy-spins rather than overwrite unconsumed data.

mod ring;

mod consumer;
mod producer;

pub use consumer::BlockingConsumer;
pub use producer::BlockingProducer;
