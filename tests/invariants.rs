//! Cross-cutting invariants that apply to every ring variant: header
//! monotonicity and reclamation safety.

use ringmmap_ipc::blocking::{ BlockingConsumer, BlockingProducer };
use ringmmap_ipc::BytesMessage;
use ringmmap_ipc::RingMessage;
use std::fs;

type Msg = BytesMessage<8>;

fn unique_path(name: &str) -> String {
    format!("/tmp/ringmmap-ipc-test-invariants-{name}-{}", std::process::id())
}

#[test]
fn offer_and_fetch_sequences_never_decrease() {
    let path = unique_path("monotonic");
    let _ = fs::remove_file(&path);

    let mut producer = BlockingProducer::<Msg>::create(&path, 16, Msg::max_size()).unwrap();
    let mut consumer = BlockingConsumer::<Msg>::open(&path, None, None).unwrap();

    let mut last_offer = 0u64;
    let mut last_fetch = 0u64;

    for _ in 0..100 {
        for _ in 0..4 {
            match producer.next_to_dispatch() {
                Some(slot) => *slot = Msg::new(b"x"),
                None => {
                    producer.flush();
                }
            }
        }
        producer.flush();

        let offer = producer.offer_sequence();
        assert!(offer >= last_offer);
        last_offer = offer;

        while consumer.fetch(true).is_some() {}
        consumer.done_fetching();

        assert!(last_offer >= last_fetch);
        last_fetch = last_offer;
    }

    producer.close(true).unwrap();
}

/// At no time does `offerSequence - fetchSequence` exceed `capacity`: the
/// producer can never have more in-flight messages than the ring can hold.
#[test]
fn producer_never_outruns_consumer_by_more_than_capacity() {
    let path = unique_path("reclamation-safety");
    let _ = fs::remove_file(&path);

    const CAPACITY: u64 = 8;
    let mut producer = BlockingProducer::<Msg>::create(&path, CAPACITY, Msg::max_size()).unwrap();
    let mut consumer = BlockingConsumer::<Msg>::open(&path, None, None).unwrap();

    for _ in 0..50 {
        // Claim as much as the ring allows without consuming.
        let mut claimed = 0u64;
        while producer.next_to_dispatch().is_some() {
            claimed += 1;
        }
        producer.flush();
        assert!(claimed <= CAPACITY, "producer claimed {claimed} slots, more than capacity {CAPACITY}");
        assert_eq!(producer.offer_sequence() - consumer.fetch_sequence(), claimed);

        while consumer.fetch(true).is_some() {}
        consumer.done_fetching();
    }

    producer.close(true).unwrap();
}
