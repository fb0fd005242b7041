//! Benchmarks for submission and execution overhead

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use foundry::{PoolConfig, ThreadPool, WorkMode};
use std::time::Duration;

fn bench_fixed_submit_join(c: &mut Criterion) {
    let pool = ThreadPool::new(4).unwrap();
    pool.set_max_queue_length(10_000);

    c.bench_function("fixed_submit_join", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..100)
                .map(|i| pool.submit(move || black_box(i * i)).unwrap())
                .collect();
            let sum: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
            black_box(sum)
        });
    });

    pool.close();
}

fn bench_elastic_submit_join(c: &mut Criterion) {
    let pool = ThreadPool::with_config(
        PoolConfig::builder()
            .workers(2)
            .mode(WorkMode::Elastic)
            .max_queue_length(10_000)
            .admission_timeout(Duration::from_millis(500))
            .build()
            .unwrap(),
    )
    .unwrap();

    c.bench_function("elastic_submit_join", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..100)
                .map(|i| pool.submit(move || black_box(i * i)).unwrap())
                .collect();
            let sum: i64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
            black_box(sum)
        });
    });

    pool.close();
}

fn bench_prioritized_submission(c: &mut Criterion) {
    let pool = ThreadPool::new(4).unwrap();
    pool.set_max_queue_length(10_000);

    c.bench_function("prioritized_submission", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..100usize)
                .map(|i| {
                    pool.submit_with_priority(move || black_box(i), i % 5)
                        .unwrap()
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    });

    pool.close();
}

criterion_group!(
    benches,
    bench_fixed_submit_join,
    bench_elastic_submit_join,
    bench_prioritized_submission
);
criterion_main!(benches);
