//! Blocking SPSC demo: a producer thread sends 1,000,000 messages and a
//! consumer thread fetches all of them, verifying order and completeness.

use ringmmap_ipc::blocking::{ BlockingConsumer, BlockingProducer };
use ringmmap_ipc::BytesMessage;
use ringmmap_ipc::RingMessage;
use std::thread;
use std::time::Instant;

type Msg = BytesMessage<8>;

const RING_CAPACITY: u64 = 4096;
const MESSAGE_COUNT: u64 = 1_000_000;
const PATH: &str = "/tmp/ringmmap-ipc-demo-blocking";

fn main() {
    tracing_subscriber::fmt::init();
    let _ = std::fs::remove_file(PATH);

    let mut producer = BlockingProducer::<Msg>::create(PATH, RING_CAPACITY, Msg::max_size()).unwrap();

    let producer_thread = thread::spawn(move || {
        let mut sent = 0u64;
        while sent < MESSAGE_COUNT {
            match producer.next_to_dispatch() {
                Some(slot) => {
                    sent += 1;
                    *slot = Msg::new(&sent.to_le_bytes());
                    if sent % 64 == 0 {
                        producer.flush();
                    }
                }
                None => {
                    producer.flush();
                }
            }
        }
        producer.flush();
        producer.close(false).unwrap();
    });

    thread::sleep(std::time::Duration::from_millis(10));
    let mut consumer = BlockingConsumer::<Msg>::open(PATH, None, None).unwrap();

    let start = Instant::now();
    let mut received = 0u64;
    let mut expected = 1u64;
    while received < MESSAGE_COUNT {
        match consumer.fetch(true) {
            Some(message) => {
                let identifier = u64::from_le_bytes(message.as_slice().try_into().unwrap());
                assert_eq!(identifier, expected, "messages must arrive in order");
                expected += 1;
                received += 1;
            }
            None => {
                consumer.done_fetching();
            }
        }
    }
    consumer.done_fetching();

    producer_thread.join().unwrap();
    consumer.close(true).unwrap();

    let elapsed = start.elapsed();
    println!(
        "blocking spsc: {received} messages in {:.3}s ({:.1} msgs/sec)",
        elapsed.as_secs_f64(),
        (received as f64) / elapsed.as_secs_f64()
    );
}
