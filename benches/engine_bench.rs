use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use crossbeam_utils::sync::WaitGroup;
use mini_kv::{KvEngine, KvStore, Request, SharedQueueThreadPool, ThreadPool};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const KEYS: usize = 1000;

fn random_keys(rng: &mut SmallRng) -> Vec<String> {
    (0..KEYS)
        .map(|_| format!("key{}", rng.gen_range(0..100_000)))
        .collect()
}

fn set_bench(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(1);
    c.bench_function("kv_store_set", |b| {
        b.iter_batched(
            || (KvStore::new(), random_keys(&mut rng)),
            |(store, keys)| {
                for key in keys {
                    store.set(key, "value".to_owned());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn get_bench(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(2);
    let store = KvStore::new();
    let keys = random_keys(&mut rng);
    for key in &keys {
        store.set(key.clone(), "value".to_owned());
    }
    c.bench_function("kv_store_get", |b| {
        b.iter(|| {
            for key in &keys {
                store.get(key);
            }
        })
    });
}

fn parse_execute_bench(c: &mut Criterion) {
    let store = KvStore::new();
    c.bench_function("parse_and_execute", |b| {
        b.iter(|| {
            Request::parse("SET greeting hello world\n").execute(&store);
            Request::parse("GET greeting\n").execute(&store);
        })
    });
}

fn pool_bench(c: &mut Criterion) {
    let pool = SharedQueueThreadPool::new(4).unwrap();
    c.bench_function("shared_queue_pool_1000_jobs", |b| {
        b.iter(|| {
            let wg = WaitGroup::new();
            let counter = Arc::new(AtomicUsize::new(0));
            for _ in 0..1000 {
                let wg = wg.clone();
                let counter = Arc::clone(&counter);
                pool.spawn(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                    drop(wg);
                })
                .unwrap();
            }
            wg.wait();
        })
    });
}

criterion_group!(benches, set_bench, get_bench, parse_execute_bench, pool_bench);
criterion_main!(benches);
