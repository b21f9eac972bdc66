//! Real-world benchmark: mobile user interaction tracking across a
//! producer/consumer process pair, using the non-blocking SPSC ring.

use criterion::{ criterion_group, criterion_main, Criterion, Throughput };
use ringmmap_ipc::nonblocking::{ NonBlockingConsumer, NonBlockingProducer };
use ringmmap_ipc::BytesMessage;
use ringmmap_ipc::RingMessage;
use std::sync::atomic::{ AtomicBool, AtomicU64, Ordering };
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use std::fs;

type Msg = BytesMessage<8>;

const TEST_PATH: &str = "/tmp/ringmmap-ipc-trace-bench";
const RING_CAPACITY: u64 = 64 * 1024;

const EVENT_CLICK: u64 = 1;
const EVENT_SCROLL: u64 = 2;
const EVENT_PAGEVIEW: u64 = 3;
const EVENT_PURCHASE: u64 = 4;
const EVENT_LOGIN: u64 = 5;

const EVENTS_PER_TYPE: u64 = 200_000;
const TOTAL_EVENTS: u64 = EVENTS_PER_TYPE * 5;

fn cleanup() {
    let _ = fs::remove_file(TEST_PATH);
}

fn run_ipc_trace_bench() -> (f64, bool) {
    cleanup();

    let running = Arc::new(AtomicBool::new(true));
    let counts: [Arc<AtomicU64>; 5] = std::array::from_fn(|_| Arc::new(AtomicU64::new(0)));

    let start = Instant::now();

    let running_producer = running.clone();
    let producer_thread = thread::spawn(move || {
        let mut producer = NonBlockingProducer::<Msg>::create(
            TEST_PATH,
            RING_CAPACITY,
            Msg::max_size(),
            false
        ).unwrap();
        let mut event_type = EVENT_CLICK;
        let mut sent = 0u64;

        while sent < TOTAL_EVENTS && running_producer.load(Ordering::Relaxed) {
            *producer.next_to_dispatch() = Msg::new(&event_type.to_le_bytes());
            producer.flush();
            sent += 1;
            event_type = if event_type >= EVENT_LOGIN { EVENT_CLICK } else { event_type + 1 };
        }
        sent
    });

    thread::sleep(std::time::Duration::from_millis(10));

    let running_consumer = running.clone();
    let local_counts = counts.clone();
    let consumer_thread = thread::spawn(move || {
        let mut consumer = NonBlockingConsumer::<Msg>
            ::open(TEST_PATH, Some(RING_CAPACITY), Msg::max_size(), false, 1.0)
            .unwrap();
        let mut received = 0u64;

        while received < TOTAL_EVENTS && running_consumer.load(Ordering::Relaxed) {
            if let Some(message) = consumer.fetch(true) {
                let event_type = u64::from_le_bytes(message.as_slice().try_into().unwrap());
                let index = (event_type - 1) as usize;
                local_counts[index].fetch_add(1, Ordering::Relaxed);
                received += 1;
            }
        }
        received
    });

    let sent = producer_thread.join().unwrap();
    running.store(false, Ordering::SeqCst);
    let received = consumer_thread.join().unwrap();

    let duration = start.elapsed().as_secs_f64();
    let throughput = (received as f64) / duration / 1_000_000.0;

    let total: u64 = counts
        .iter()
        .map(|c| c.load(Ordering::Relaxed))
        .sum();
    let verified = sent == TOTAL_EVENTS && total == received;

    cleanup();
    (throughput, verified)
}

fn benchmark_ipc_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("ipc-trace-events");
    group.throughput(Throughput::Elements(TOTAL_EVENTS));
    group.sample_size(10);

    group.bench_function("non_blocking_spsc", |b| {
        b.iter(|| {
            let (_throughput, verified) = run_ipc_trace_bench();
            assert!(verified, "data integrity check failed");
            TOTAL_EVENTS
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_ipc_trace);
criterion_main!(benches);
