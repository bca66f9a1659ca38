//! Model-based property coverage: random operation sequences replayed
//! against a plain ordered map, with aggregates and structure checked after
//! every step.

use std::collections::BTreeMap;

use proptest::prelude::*;

use super::support::{acc, assert_structure, tree};
use crate::node::Accumulation;

#[derive(Debug, Clone)]
enum Op {
    Set(Vec<u8>, u128),
    Remove(Vec<u8>),
    Increase(Vec<u8>, u128),
    Decrease(Vec<u8>, u128),
    Clear,
}

/// Short keys over a tiny alphabet, so sequences collide often enough to
/// exercise overwrites, splits and merges on shared paths. Keys stay
/// non-empty: the empty key is the seeded sentinel, which callers do not
/// write to.
fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..4, 1..3)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (key_strategy(), 0u128..1000).prop_map(|(key, value)| Op::Set(key, value)),
        2 => key_strategy().prop_map(Op::Remove),
        2 => (key_strategy(), 0u128..1000).prop_map(|(key, delta)| Op::Increase(key, delta)),
        2 => (key_strategy(), 0u128..1000).prop_map(|(key, delta)| Op::Decrease(key, delta)),
        1 => Just(Op::Clear),
    ]
}

fn model_sum(model: &BTreeMap<Vec<u8>, u128>) -> u128 {
    model.values().sum()
}

fn replay(m: u8, ops: &[Op]) {
    let mut tree = tree(m);
    let mut model: BTreeMap<Vec<u8>, u128> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Set(key, value) => {
                tree.set(key, acc(*value));
                model.insert(key.clone(), *value);
            }
            Op::Remove(key) => {
                tree.remove(key);
                model.remove(key);
            }
            Op::Increase(key, delta) => {
                tree.increase(key, acc(*delta));
                *model.entry(key.clone()).or_insert(0) += delta;
            }
            Op::Decrease(key, delta) => {
                // accumulations never go negative, so cap at the current value
                let current = model.get(key).copied().unwrap_or(0);
                let clamped = (*delta).min(current);
                tree.decrease(key, acc(clamped));
                *model.entry(key.clone()).or_insert(0) -= clamped;
            }
            Op::Clear => {
                tree.clear();
                model.clear();
            }
        }
        assert_eq!(tree.total_accumulated_value(), acc(model_sum(&model)));
    }

    assert_structure(&tree, m);

    // every surviving leaf matches the model, the seeded sentinel aside
    let tree_leaves: Vec<(Vec<u8>, Accumulation)> = tree
        .iter(None, None)
        .filter(|(key, accumulation)| !(key.is_empty() && *accumulation == Accumulation::ZERO))
        .collect();
    let model_leaves: Vec<(Vec<u8>, Accumulation)> = model
        .iter()
        .map(|(key, &value)| (key.clone(), acc(value)))
        .filter(|(key, accumulation)| !(key.is_empty() && *accumulation == Accumulation::ZERO))
        .collect();
    assert_eq!(tree_leaves, model_leaves);
    assert_eq!(tree.is_empty(), tree_leaves.is_empty());

    let total = model_sum(&model);
    let probes: [&[u8]; 6] = [&[], &[0], &[1], &[1, 3], &[2], &[3, 3]];
    for probe in probes {
        let left: u128 = model
            .iter()
            .filter(|(key, _)| key.as_slice() < probe)
            .map(|(_, &value)| value)
            .sum();
        let exact = model.get(probe).copied().unwrap_or(0);
        let right = total - left - exact;

        let split = tree.split_acc(probe);
        assert_eq!(split.left, acc(left));
        assert_eq!(split.exact, acc(exact));
        assert_eq!(split.right, acc(right));
        assert_eq!(tree.prefix_sum(probe), acc(left + exact));
    }

    for (position, start) in probes.iter().enumerate() {
        for end in &probes[position..] {
            let expected: u128 = model
                .iter()
                .filter(|(key, _)| key.as_slice() >= *start && key.as_slice() <= *end)
                .map(|(_, &value)| value)
                .sum();
            assert_eq!(
                tree.subset_accumulation(Some(*start), Some(*end)),
                acc(expected)
            );
        }
    }
}

proptest! {
    #[test]
    fn test_operations_match_model(
        m in 2u8..8,
        ops in proptest::collection::vec(op_strategy(), 1..60),
    ) {
        replay(m, &ops);
    }
}
