use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;
use transposed_hash::{HashedMap, IntSet, ObjectMap};

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    c.bench_function("object::insert_fresh_100k", |b| {
        b.iter_batched(
            ObjectMap::<String, u64>::default,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_hashed_fresh_100k(c: &mut Criterion) {
    c.bench_function("hashed::insert_fresh_100k", |b| {
        b.iter_batched(
            HashedMap::<String, u64>::default,
            |mut m| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    m.put(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_insert_warm_100k(c: &mut Criterion) {
    c.bench_function("object::insert_warm_100k", |b| {
        b.iter_batched(
            || {
                // Pre-grow and then clear; capacity is kept
                let mut m = ObjectMap::<String, u64>::default();
                for (i, x) in lcg(2).take(110_000).enumerate() {
                    m.put(key(x), i as u64).unwrap();
                }
                m.clear_all();
                m
            },
            |mut m| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    m.put(key(x), i as u64).unwrap();
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_lookup_hit_100k(c: &mut Criterion) {
    let mut m = ObjectMap::<String, u64>::default();
    let keys: Vec<String> = lcg(4).take(100_000).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        m.put(k.clone(), i as u64).unwrap();
    }
    c.bench_function("object::get_hit_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &keys {
                sum = sum.wrapping_add(*m.get(k.as_str()).unwrap());
            }
            black_box(sum)
        })
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("object::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m = ObjectMap::<String, u64>::default();
                let keys: Vec<String> = lcg(5).take(110_000).map(key).collect();
                for (i, k) in keys.iter().enumerate() {
                    m.put(k.clone(), i as u64).unwrap();
                }
                // Precompute 10k unique indices via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let to_remove: Vec<String> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (m, to_remove)
            },
            |(mut m, to_remove)| {
                for k in &to_remove {
                    let _ = m.remove(k.as_str());
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_cursor_retain_100k(c: &mut Criterion) {
    c.bench_function("int::cursor_retain_half_100k", |b| {
        b.iter_batched(
            || {
                let mut s = IntSet::default();
                for x in lcg(6).take(100_000) {
                    s.put_key(x as i32).unwrap();
                }
                s
            },
            |mut s| {
                let mut cursor = s.cursor();
                while let Some(slot) = cursor.next() {
                    if cursor.table().key(slot).is_some_and(|k| k & 1 == 0) {
                        cursor.remove().unwrap();
                    }
                }
                drop(cursor);
                black_box(s)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_compact_after_removals(c: &mut Criterion) {
    c.bench_function("object::compact_50k_of_100k", |b| {
        b.iter_batched(
            || {
                let mut m = ObjectMap::<u64, u64>::default();
                for (i, x) in lcg(7).take(100_000).enumerate() {
                    m.put(x, i as u64).unwrap();
                }
                for x in lcg(7).take(100_000).step_by(2) {
                    m.remove(&x);
                }
                m
            },
            |mut m| {
                m.compact().unwrap();
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert_fresh_100k, bench_insert_hashed_fresh_100k, bench_insert_warm_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_lookup_hit_100k,
              bench_remove_random_10k,
              bench_cursor_retain_100k,
              bench_compact_after_removals
}
criterion_main!(benches_insert, benches_ops);
