//! Shared helpers for the cross-module suite.

use std::collections::{BTreeMap, BTreeSet};

use crate::key;
use crate::node::{Accumulation, Branch, Leaf};
use crate::store::{prefix_end, KvStore, MemoryStore};
use crate::Tree;

pub fn tree(m: u8) -> Tree<MemoryStore> {
    Tree::new(MemoryStore::new(), m)
}

pub fn acc(value: u128) -> Accumulation {
    Accumulation::new(value)
}

/// Every persisted record, grouped by level and keyed by the tree-relative
/// node key.
pub fn records_by_level<S: KvStore>(store: &S) -> BTreeMap<u16, BTreeMap<Vec<u8>, Vec<u8>>> {
    let end = prefix_end(key::NODE_PREFIX);
    let mut by_level: BTreeMap<u16, BTreeMap<Vec<u8>, Vec<u8>>> = BTreeMap::new();
    for (raw, value) in store.iter(key::NODE_PREFIX, end.as_deref()) {
        let (level, node_key) = key::parse_node_key(&raw).expect("well-formed node key");
        by_level
            .entry(level)
            .or_default()
            .insert(node_key.to_vec(), value);
    }
    by_level
}

/// Highest level holding a record, if any.
pub fn top_level<S: KvStore>(store: &S) -> Option<u16> {
    records_by_level(store).keys().next_back().copied()
}

/// Asserts every structural property the store must uphold between
/// operations: a single empty-keyed root at the top level, branch sizes
/// within 1..=m, children sorted strictly ascending and never keyed below
/// their node, recorded child totals equal to the child nodes' own totals,
/// and every node below the top referenced exactly once from above.
pub fn assert_structure<S: KvStore>(tree: &Tree<S>, m: u8) {
    let by_level = records_by_level(tree.store());
    let Some((&top, top_nodes)) = by_level.iter().next_back() else {
        return;
    };
    assert_eq!(top_nodes.len(), 1, "level {top} should hold a single root");
    assert!(
        top_nodes.contains_key(&Vec::new()),
        "root should sit at the empty key"
    );

    if let Some(leaves) = by_level.get(&0) {
        for (leaf_key, value) in leaves {
            let leaf = Leaf::decode(value).expect("decodable leaf");
            assert_eq!(
                leaf.key(),
                leaf_key.as_slice(),
                "leaf stored under the wrong key"
            );
        }
    }

    for (&level, nodes) in by_level.iter().filter(|(&level, _)| level > 0) {
        let below = by_level.get(&(level - 1));
        let mut referenced: BTreeSet<Vec<u8>> = BTreeSet::new();
        for (node_key, value) in nodes {
            let node = Branch::decode(value).expect("decodable branch");
            assert!(
                (1..=usize::from(m)).contains(&node.len()),
                "branch {}:{} outside size bounds with {} children",
                level,
                hex::encode(node_key),
                node.len()
            );
            let children = node.children();
            assert!(
                children[0].index() >= node_key.as_slice(),
                "branch {}:{} keyed above its first child",
                level,
                hex::encode(node_key)
            );
            for pair in children.windows(2) {
                assert!(
                    pair[0].index() < pair[1].index(),
                    "children of {}:{} out of order",
                    level,
                    hex::encode(node_key)
                );
            }
            for child in children {
                let stored = below
                    .and_then(|nodes| nodes.get(child.index()))
                    .unwrap_or_else(|| {
                        panic!(
                            "child {} of {}:{} missing at the level below",
                            hex::encode(child.index()),
                            level,
                            hex::encode(node_key)
                        )
                    });
                let total = if level == 1 {
                    Leaf::decode(stored).expect("decodable leaf").accumulation()
                } else {
                    Branch::decode(stored)
                        .expect("decodable branch")
                        .accumulation()
                };
                assert_eq!(
                    child.accumulation(),
                    total,
                    "stale aggregate for child {} of {}:{}",
                    hex::encode(child.index()),
                    level,
                    hex::encode(node_key)
                );
                assert!(
                    referenced.insert(child.index().to_vec()),
                    "child {} referenced twice at level {}",
                    hex::encode(child.index()),
                    level
                );
            }
        }
        let expected: BTreeSet<Vec<u8>> = below
            .map(|nodes| nodes.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(
            referenced,
            expected,
            "level {} nodes not covered exactly once",
            level - 1
        );
    }
}
