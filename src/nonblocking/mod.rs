//! Non-blocking, overwriting SPSC ring: the producer never refuses a claim;
//! a lagging consumer detects wrap-overtake instead of ever stalling the
//! producer.

mod ring;

mod consumer;
mod producer;

pub use consumer::{ NonBlockingConsumer, WRAPPED };
pub use producer::NonBlockingProducer;
