use sumtree::{Accumulation, MemoryStore, Tree, DEFAULT_BRANCHING_FACTOR};

fn main() {
    let mut tree = Tree::new(MemoryStore::new(), DEFAULT_BRANCHING_FACTOR);

    tree.set(b"validator/alice", Accumulation::new(120));
    tree.set(b"validator/bob", Accumulation::new(80));
    tree.set(b"validator/carol", Accumulation::new(200));
    tree.increase(b"validator/bob", Accumulation::new(20));

    println!("total stake: {}", tree.total_accumulated_value());
    println!(
        "stake at or below bob: {}",
        tree.prefix_sum(b"validator/bob")
    );
    println!(
        "stake from bob through carol: {}",
        tree.subset_accumulation(Some(b"validator/bob"), Some(b"validator/carol"))
    );

    let split = tree.split_acc(b"validator/bob");
    println!(
        "around bob: {} before, {} at, {} after",
        split.left, split.exact, split.right
    );

    for (key, weight) in tree.iter(Some(b"validator/"), None) {
        println!("{} -> {weight}", String::from_utf8_lossy(&key));
    }

    print!("{}", tree.debug_visualize());
}
