//! Throughput Benchmark for LineKV
//!
//! Measures the line parser, the record stores, and the executor under
//! concurrent load, where every operation funnels through the single store lock.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use linekv::protocol::parse;
use linekv::storage::{MemoryStore, RecordStore, SqliteStore};
use linekv::CommandExecutor;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Benchmark the line parser
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put", |b| {
        b.iter(|| black_box(parse(black_box("PUT session:1234 token-abcdef"))));
    });

    group.bench_function("unknown", |b| {
        b.iter(|| black_box(parse(black_box("FROB session:1234"))));
    });

    group.finish();
}

/// Benchmark PUT/GET against both stores
fn bench_stores(c: &mut Criterion) {
    let mut group = c.benchmark_group("store");
    group.throughput(Throughput::Elements(1));

    let mut memory = MemoryStore::new();
    group.bench_function("memory_put_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            if memory.exists(&key).unwrap() {
                memory.update(&key, "value").unwrap();
            } else {
                memory.insert(&key, "value").unwrap();
            }
            black_box(memory.get(&key).unwrap());
            i += 1;
        });
    });

    let mut sqlite = SqliteStore::open_in_memory().unwrap();
    group.bench_function("sqlite_put_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 10_000);
            if sqlite.exists(&key).unwrap() {
                sqlite.update(&key, "value").unwrap();
            } else {
                sqlite.insert(&key, "value").unwrap();
            }
            black_box(sqlite.get(&key).unwrap());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent executor access (all tasks share one lock)
fn bench_concurrent(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_tasks_mixed", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let executor = CommandExecutor::new(MemoryStore::new());
                let handles: Vec<_> = (0..4)
                    .map(|t| {
                        let executor = executor.clone();
                        tokio::spawn(async move {
                            for i in 0..1_000 {
                                let put = parse(&format!("PUT key:{}:{} value", t, i)).unwrap();
                                executor.execute(put).await;
                                let get = parse(&format!("GET key:{}:{}", t, i)).unwrap();
                                black_box(executor.execute(get).await);
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.await.unwrap();
                }
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_stores, bench_concurrent);

criterion_main!(benches);
