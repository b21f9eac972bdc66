//! Broadcast demo: one producer, three consumers, each independently
//! observing every message in the same order.

use ringmmap_ipc::broadcast::{ BroadcastConsumer, BroadcastProducer };
use ringmmap_ipc::BytesMessage;
use ringmmap_ipc::RingMessage;
use std::thread;

type Msg = BytesMessage<8>;

const RING_CAPACITY: u64 = 1024;
const NUMBER_OF_CONSUMERS: u64 = 3;
const MESSAGE_COUNT: u64 = 100_000;
const PATH: &str = "/tmp/ringmmap-ipc-demo-broadcast";

fn main() {
    tracing_subscriber::fmt::init();
    let _ = std::fs::remove_file(PATH);

    let mut producer = BroadcastProducer::<Msg>
        ::create(PATH, RING_CAPACITY, NUMBER_OF_CONSUMERS, Msg::max_size())
        .unwrap();

    let consumer_threads: Vec<_> = (0..NUMBER_OF_CONSUMERS)
        .map(|index| {
            thread::spawn(move || {
                let mut consumer = BroadcastConsumer::<Msg>
                    ::open(PATH, index, Some(RING_CAPACITY), None, Msg::max_size())
                    .unwrap();
                let mut expected = 1u64;
                while expected <= MESSAGE_COUNT {
                    match consumer.fetch(true) {
                        Some(message) => {
                            let identifier = u64::from_le_bytes(message.as_slice().try_into().unwrap());
                            assert_eq!(identifier, expected);
                            expected += 1;
                        }
                        None => {
                            consumer.done_fetching();
                        }
                    }
                }
                consumer.done_fetching();
            })
        })
        .collect();

    thread::sleep(std::time::Duration::from_millis(10));
    for i in 1..=MESSAGE_COUNT {
        loop {
            match producer.next_to_dispatch() {
                Some(slot) => {
                    *slot = Msg::new(&i.to_le_bytes());
                    break;
                }
                None => {
                    producer.flush();
                }
            }
        }
        if i % 64 == 0 {
            producer.flush();
        }
    }
    producer.flush();

    for handle in consumer_threads {
        handle.join().unwrap();
    }
    producer.close(true).unwrap();
    println!("broadcast: {NUMBER_OF_CONSUMERS} consumers each observed {MESSAGE_COUNT} messages in order");
}
