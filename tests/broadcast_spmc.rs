//! Integration tests for the blocking SPMC broadcast ring.

use ringmmap_ipc::broadcast::{ BroadcastConsumer, BroadcastProducer };
use ringmmap_ipc::BytesMessage;
use ringmmap_ipc::RingMessage;
use std::fs;
use std::thread;
use std::time::Duration;

type Msg = BytesMessage<8>;

fn unique_path(name: &str) -> String {
    format!("/tmp/ringmmap-ipc-test-broadcast-{name}-{}", std::process::id())
}

/// 3 consumers, 1,000,000 messages, each consumer independently observes
/// the identical ordered sequence with no gaps.
#[test]
fn three_consumers_each_observe_every_message_in_order() {
    let path = unique_path("fairness");
    let _ = fs::remove_file(&path);

    const COUNT: u64 = 1_000_000;
    const CONSUMERS: u64 = 3;

    let mut producer = BroadcastProducer::<Msg>::create(&path, 4096, CONSUMERS, Msg::max_size()).unwrap();

    let consumer_threads: Vec<_> = (0..CONSUMERS)
        .map(|index| {
            let path = path.clone();
            thread::spawn(move || {
                let mut consumer = BroadcastConsumer::<Msg>
                    ::open(&path, index, Some(4096), None, Msg::max_size())
                    .unwrap();
                let mut received: Vec<u64> = Vec::with_capacity(COUNT as usize);
                while (received.len() as u64) < COUNT {
                    let available = consumer.available_to_fetch();
                    for _ in 0..available {
                        let message = consumer.fetch(true).unwrap();
                        received.push(u64::from_le_bytes(message.as_slice().try_into().unwrap()));
                    }
                    consumer.done_fetching();
                }
                received
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(5));
    let mut sent = 0u64;
    while sent < COUNT {
        match producer.next_to_dispatch() {
            Some(slot) => {
                sent += 1;
                *slot = Msg::new(&sent.to_le_bytes());
                if sent % 128 == 0 {
                    producer.flush();
                }
            }
            None => {
                producer.flush();
            }
        }
    }
    producer.flush();

    let expected: Vec<u64> = (1..=COUNT).collect();
    for handle in consumer_threads {
        let received = handle.join().unwrap();
        assert_eq!(received, expected);
    }
    producer.close(true).unwrap();
}

#[test]
fn disabled_consumer_no_longer_gates_the_producer() {
    let path = unique_path("disable-gate");
    let _ = fs::remove_file(&path);

    let mut producer = BroadcastProducer::<Msg>::create(&path, 4, 2, Msg::max_size()).unwrap();
    let mut slow = BroadcastConsumer::<Msg>::open(&path, 1, Some(4), None, Msg::max_size()).unwrap();
    let mut fast = BroadcastConsumer::<Msg>::open(&path, 0, Some(4), None, Msg::max_size()).unwrap();

    for i in 0..4u8 {
        *producer.next_to_dispatch().unwrap() = Msg::new(&[i]);
    }
    producer.flush();
    // Ring is now full with respect to both consumers; a 5th claim blocks.
    assert!(producer.next_to_dispatch().is_none());

    slow.disable();
    assert!(producer.next_to_dispatch().is_some(), "disabling the slow consumer should free capacity");
    producer.flush();

    for _ in 0..4 {
        fast.fetch(true).unwrap();
    }
    fast.done_fetching();

    producer.close(true).unwrap();
}

#[test]
fn power_of_two_and_non_power_of_two_capacities_both_work() {
    for capacity in [8u64, 10u64] {
        let path = unique_path(&format!("capacity-{capacity}"));
        let _ = fs::remove_file(&path);

        let mut producer = BroadcastProducer::<Msg>::create(&path, capacity, 1, Msg::max_size()).unwrap();
        for i in 0..capacity {
            *producer.next_to_dispatch().unwrap() = Msg::new(&(i as u32).to_le_bytes());
        }
        producer.flush();

        let mut consumer = BroadcastConsumer::<Msg>::open(&path, 0, Some(capacity), None, Msg::max_size()).unwrap();
        let mut seen = Vec::new();
        while (seen.len() as u64) < capacity {
            if let Some(message) = consumer.fetch(true) {
                seen.push(u32::from_le_bytes(message.as_slice().try_into().unwrap()));
            }
        }
        consumer.done_fetching();
        assert_eq!(seen, (0..capacity as u32).collect::<Vec<_>>());

        consumer.close(true).unwrap();
    }
}
