use criterion::{criterion_group, criterion_main, Criterion};
use sumtree::{Accumulation, MemoryStore, Tree};

pub fn generate_random_key() -> [u8; 16] {
    let mut key = [0u8; 16];
    for byte in key.iter_mut() {
        *byte = rand::random();
    }
    key
}

fn populated_tree(entries: usize) -> (Tree<MemoryStore>, Vec<[u8; 16]>) {
    let mut tree = Tree::new(MemoryStore::new(), 16);
    let mut keys = Vec::with_capacity(entries);
    for _ in 0..entries {
        let key = generate_random_key();
        tree.set(&key, Accumulation::new(rand::random::<u32>() as u128));
        keys.push(key);
    }
    keys.sort();
    (tree, keys)
}

fn bench_queries(c: &mut Criterion) {
    let (tree, keys) = populated_tree(1000);
    let mut group = c.benchmark_group("Sumtree Queries");

    group.bench_function("Total", |b| b.iter(|| tree.total_accumulated_value()));

    group.bench_function("Prefix Sum", |b| {
        let mut cursor = 0;
        b.iter(|| {
            cursor = (cursor + 1) % keys.len();
            tree.prefix_sum(&keys[cursor])
        })
    });

    group.bench_function("Split", |b| {
        let mut cursor = 0;
        b.iter(|| {
            cursor = (cursor + 1) % keys.len();
            tree.split_acc(&keys[cursor])
        })
    });

    group.bench_function("Subset", |b| {
        let start = keys[keys.len() / 4].as_slice();
        let end = keys[3 * keys.len() / 4].as_slice();
        b.iter(|| tree.subset_accumulation(Some(start), Some(end)))
    });

    group.finish();
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
