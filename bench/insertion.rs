use criterion::{criterion_group, criterion_main, Criterion};
use sumtree::{Accumulation, MemoryStore, Tree};

pub fn generate_random_key() -> [u8; 16] {
    let mut key = [0u8; 16];
    for byte in key.iter_mut() {
        *byte = rand::random();
    }
    key
}

pub fn generate_random_weight() -> Accumulation {
    Accumulation::new(rand::random::<u32>() as u128)
}

fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sumtree Insertion");

    for m in [4u8, 10, 32] {
        group.bench_function(format!("m = {m}"), |b| {
            b.iter(|| {
                let mut tree = Tree::new(MemoryStore::new(), m);
                for _ in 0..100 {
                    tree.set(&generate_random_key(), generate_random_weight());
                }
            })
        });
    }

    group.finish();
}

fn bench_removal(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sumtree Removal");

    group.bench_function("m = 10", |b| {
        b.iter_with_setup(
            || {
                let mut tree = Tree::new(MemoryStore::new(), 10);
                let mut keys = Vec::with_capacity(100);
                for _ in 0..100 {
                    let key = generate_random_key();
                    tree.set(&key, generate_random_weight());
                    keys.push(key);
                }
                (tree, keys)
            },
            |(mut tree, keys)| {
                for key in &keys {
                    tree.remove(key);
                }
            },
        )
    });

    group.finish();
}

criterion_group!(benches, bench_insertion, bench_removal);
criterion_main!(benches);
