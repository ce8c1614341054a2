use criterion::{criterion_group, criterion_main, Criterion, BatchSize, BenchmarkId};
use remoteq_queue::{
    FifoQueue,
    MemoryStore,
    Priority,
    PriorityQueue,
    QueueConfig,
    SledStore,
    StoreHandle,
};
use std::sync::Arc;

fn stores() -> Vec<(&'static str, StoreHandle)> {
    vec![
        ("memory", Arc::new(MemoryStore::new())),
        ("sled", Arc::new(SledStore::temporary().unwrap())),
    ]
}

fn benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo::put_get");
    for (name, store) in stores() {
        let queue = FifoQueue::<Vec<u8>>::new(QueueConfig::new("bench-fifo", 0), store).unwrap();
        group.bench_with_input(BenchmarkId::new(name, 64), &queue, |b, queue| {
            b.iter(|| {
                queue.put(vec![42u8; 64]).unwrap();
                queue.get().unwrap();
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("priority::fill_drain");
    for size in [10u32, 100, 1000].iter() {
        for (name, store) in stores() {
            let queue = PriorityQueue::<u32>::new(QueueConfig::new("bench-pri", 0), store).unwrap();
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, &size| {
                b.iter_batched(
                    || queue.clear().unwrap(),
                    |_| {
                        for i in 0..size {
                            queue.put((Priority::from((i % 17) as i64), i)).unwrap();
                        }
                        for _ in 0..size {
                            queue.get().unwrap();
                        }
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
