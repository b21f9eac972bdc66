//! Non-blocking SPSC demo: a producer that never waits, and a consumer
//! that reports a wrap if it falls too far behind.

use ringmmap_ipc::nonblocking::{ NonBlockingConsumer, NonBlockingProducer, WRAPPED };
use ringmmap_ipc::BytesMessage;
use ringmmap_ipc::RingMessage;
use std::thread;
use std::time::Duration;

type Msg = BytesMessage<8>;

const RING_CAPACITY: u64 = 1024;
const MESSAGE_COUNT: u64 = 2000;
const PATH: &str = "/tmp/ringmmap-ipc-demo-nonblocking";

fn main() {
    tracing_subscriber::fmt::init();
    let _ = std::fs::remove_file(PATH);

    let mut producer = NonBlockingProducer::<Msg>
        ::create(PATH, RING_CAPACITY, Msg::max_size(), false)
        .unwrap();

    // Publish everything before any consumer attaches, to demonstrate wrap
    // detection deliberately.
    for i in 1..=MESSAGE_COUNT {
        *producer.next_to_dispatch() = Msg::new(&i.to_le_bytes());
        producer.flush();
    }

    let mut consumer = NonBlockingConsumer::<Msg>
        ::open(PATH, Some(RING_CAPACITY), Msg::max_size(), false, 1.0)
        .unwrap();

    match consumer.available_to_fetch() {
        WRAPPED => println!("consumer started too late: producer has wrapped past it, as expected"),
        n => println!("unexpectedly caught up with {n} messages still available"),
    }

    // Now demonstrate the steady-state, no-wrap path.
    std::fs::remove_file(PATH).ok();
    let mut producer = NonBlockingProducer::<Msg>
        ::create(PATH, RING_CAPACITY, Msg::max_size(), false)
        .unwrap();
    let producer_thread = thread::spawn(move || {
        for i in 1..=MESSAGE_COUNT {
            *producer.next_to_dispatch() = Msg::new(&i.to_le_bytes());
            producer.flush();
            thread::sleep(Duration::from_micros(50));
        }
        producer.close(false).unwrap();
    });

    thread::sleep(Duration::from_millis(5));
    let mut consumer = NonBlockingConsumer::<Msg>
        ::open(PATH, Some(RING_CAPACITY), Msg::max_size(), false, 1.0)
        .unwrap();
    let mut received = 0u64;
    while received < MESSAGE_COUNT {
        match consumer.fetch(true) {
            Some(_) => {
                received += 1;
            }
            None => {
                assert_ne!(consumer.available_to_fetch(), WRAPPED, "producer should not outrun a paced consumer");
            }
        }
    }
    producer_thread.join().unwrap();
    consumer.close(true).unwrap();
    println!("non-blocking spsc: kept pace with {received} messages, no wrap");
}
