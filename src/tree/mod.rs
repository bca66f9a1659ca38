//! The accumulation tree and its public operations.

mod ptr;

use std::fmt::Write as _;

use tracing::debug;

use crate::key;
use crate::node::{Accumulation, Leaf};
use crate::store::{prefix_end, KvStore};

use ptr::NodePtr;

/// Branching factor used when the caller has no tuning preference.
pub const DEFAULT_BRANCHING_FACTOR: u8 = 10;

/// Three-way partition of the tree's total accumulation around a probe key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulationSplit {
    /// Total over leaves ordered strictly before the key.
    pub left: Accumulation,
    /// Accumulation recorded at the key itself, zero when absent.
    pub exact: Accumulation,
    /// Total over leaves ordered strictly after the key.
    pub right: Accumulation,
}

impl AccumulationSplit {
    pub const ZERO: Self = Self {
        left: Accumulation::ZERO,
        exact: Accumulation::ZERO,
        right: Accumulation::ZERO,
    };
}

/// An accumulation-augmented B+-tree over an ordered key-value store.
///
/// Each leaf records one `(key, accumulation)` pair; each branch keeps the
/// exact total of its subtree, updated eagerly on every mutation. Prefix and
/// range sums over the live set of keys therefore cost O(log n) store
/// accesses, as do point updates.
///
/// The tree itself is a small value: a store handle and the branching
/// factor. All shape lives in the store under the tree's own key scheme, so
/// two trees opened over the same store contents behave identically.
#[derive(Debug, Clone)]
pub struct Tree<S> {
    store: S,
    m: u8,
}

impl<S: KvStore> Tree<S> {
    /// Opens the tree over `store` with branching factor `m`.
    ///
    /// A store that never held this tree is seeded with the empty-key zero
    /// sentinel leaf, so every aggregate query is defined from the first
    /// call on.
    ///
    /// # Panics
    ///
    /// When `m < 2`.
    pub fn new(store: S, m: u8) -> Self {
        assert!(m >= 2, "branching factor must be at least 2");
        let mut tree = Self { store, m };
        if !tree.store.has(&key::leaf_key(&[])) {
            tree.set(&[], Accumulation::ZERO);
        }
        tree
    }

    /// Borrow of the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the tree, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Sets the accumulation recorded for `key`, inserting or overwriting.
    pub fn set(&mut self, key: &[u8], accumulation: Accumulation) {
        let leaf = Leaf::new(key.to_vec(), accumulation);
        self.write_leaf(&leaf);
        let parent = self.parent_of(&NodePtr::leaf(key.to_vec()));
        self.push(&parent, leaf.to_child());
    }

    /// Removes `key` and its accumulation. Absent keys are a no-op.
    pub fn remove(&mut self, key: &[u8]) {
        let leaf = NodePtr::leaf(key.to_vec());
        if !self.node_exists(&leaf) {
            return;
        }
        let parent = self.parent_of(&leaf);
        self.delete_node(&leaf);
        self.pull(&parent, key);
    }

    /// Accumulation recorded for `key`, zero when absent. Never errors.
    pub fn get(&self, key: &[u8]) -> Accumulation {
        self.leaf_record(key)
            .map_or(Accumulation::ZERO, |leaf| leaf.accumulation())
    }

    /// Adds `delta` to the accumulation at `key` (zero when absent). Not
    /// atomic: concurrent writers of one key need external serialization.
    ///
    /// # Panics
    ///
    /// When the result does not fit in an [`Accumulation`].
    pub fn increase(&mut self, key: &[u8], delta: Accumulation) {
        let updated = match self.get(key).checked_add(delta) {
            Some(updated) => updated,
            None => panic!("accumulation overflow increasing {}", hex::encode(key)),
        };
        self.set(key, updated);
    }

    /// Subtracts `delta` from the accumulation at `key`.
    ///
    /// # Panics
    ///
    /// When `delta` exceeds the recorded accumulation; accumulations never
    /// go negative.
    pub fn decrease(&mut self, key: &[u8], delta: Accumulation) {
        let updated = match self.get(key).checked_sub(delta) {
            Some(updated) => updated,
            None => panic!("accumulation underflow decreasing {}", hex::encode(key)),
        };
        self.set(key, updated);
    }

    /// Deletes every record of the tree and re-seeds the sentinel, leaving
    /// exactly the state [`Tree::new`] produces on a fresh store.
    pub fn clear(&mut self) {
        let end = prefix_end(key::NODE_PREFIX);
        let doomed: Vec<Vec<u8>> = self
            .store
            .iter(key::NODE_PREFIX, end.as_deref())
            .map(|(raw, _)| raw)
            .collect();
        debug!(records = doomed.len(), "clearing tree");
        for raw in &doomed {
            self.store.delete(raw);
        }
        self.set(&[], Accumulation::ZERO);
    }

    /// Whether nothing is recorded beyond the zero-valued sentinel.
    pub fn is_empty(&self) -> bool {
        let mut leaves = self.iter(None, None);
        match leaves.next() {
            None => true,
            Some((key, accumulation)) => {
                key.is_empty() && accumulation == Accumulation::ZERO && leaves.next().is_none()
            }
        }
    }

    /// Ascending scan over the leaves in `[start, end)`, decoded to
    /// `(key, accumulation)` pairs. `None` bounds are unbounded.
    pub fn iter<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> impl Iterator<Item = (Vec<u8>, Accumulation)> + 'a {
        let (start, end) = leaf_bounds(start, end);
        self.store
            .iter(&start, end.as_deref())
            .map(decode_leaf_entry)
    }

    /// Descending scan over the leaves in `[start, end)`.
    pub fn iter_rev<'a>(
        &'a self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> impl Iterator<Item = (Vec<u8>, Accumulation)> + 'a {
        let (start, end) = leaf_bounds(start, end);
        self.store
            .iter_rev(&start, end.as_deref())
            .map(decode_leaf_entry)
    }

    /// Total accumulation over every leaf.
    pub fn total_accumulated_value(&self) -> Accumulation {
        self.subset_accumulation(None, None)
    }

    /// Total accumulation over leaves with keys at most `key`.
    pub fn prefix_sum(&self, key: &[u8]) -> Accumulation {
        self.subset_accumulation(None, Some(key))
    }

    /// Total accumulation over leaves with keys in `[start, end]`, both
    /// bounds inclusive and `None` unbounded. `start` must not order after
    /// `end`. The result always lies within zero and the tree total.
    pub fn subset_accumulation(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Accumulation {
        // the unbounded-end arm is matched first so both bounds absent
        // resolves to the full total rather than to the empty prefix
        match (start, end) {
            (start, None) => {
                let split = self.split_acc(start.unwrap_or(&[]));
                split.exact + split.right
            }
            (None, Some(end)) => {
                let split = self.split_acc(end);
                split.left + split.exact
            }
            (Some(start), Some(end)) => {
                let from_start = self.split_acc(start);
                let beyond_end = self.split_acc(end).right;
                match (from_start.exact + from_start.right).checked_sub(beyond_end) {
                    Some(total) => total,
                    None => panic!(
                        "subset range start {} orders after end {}",
                        hex::encode(start),
                        hex::encode(end)
                    ),
                }
            }
        }
    }

    /// Partitions the tree total around `key` into strictly-before, exact,
    /// and strictly-after accumulations. The three parts always sum to the
    /// total.
    pub fn split_acc(&self, key: &[u8]) -> AccumulationSplit {
        match self.root_ptr() {
            Some(root) => self.accumulation_split(&root, key),
            None => AccumulationSplit::ZERO,
        }
    }

    /// Renders every reachable node indented by depth, one line per node
    /// with its level, hex key and accumulation. Diagnostic only; the output
    /// is not load-bearing and not part of the stored format.
    pub fn debug_visualize(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root_ptr() {
            let total = self.must_branch(&root).accumulation();
            self.visualize_node(&mut out, &root, 0, total);
        }
        out
    }

    fn visualize_node(
        &self,
        out: &mut String,
        ptr: &NodePtr,
        depth: usize,
        accumulation: Accumulation,
    ) {
        if !self.node_exists(ptr) {
            return;
        }
        let _ = writeln!(
            out,
            "{}- {{{} {} {}}}",
            "  ".repeat(depth),
            ptr.level,
            hex::encode(&ptr.key),
            accumulation
        );
        if ptr.level == 0 {
            return;
        }
        let node = self.must_branch(ptr);
        for child in node.children() {
            if let Some(below) = self.child_of(ptr, child.index()) {
                self.visualize_node(out, &below, depth + 1, child.accumulation());
            }
        }
    }
}

fn leaf_bounds(start: Option<&[u8]>, end: Option<&[u8]>) -> (Vec<u8>, Option<Vec<u8>>) {
    let start = key::leaf_key(start.unwrap_or(&[]));
    let end = match end {
        Some(end) => Some(key::leaf_key(end)),
        None => prefix_end(&key::level_prefix(0)),
    };
    (start, end)
}

fn decode_leaf_entry((raw, value): (Vec<u8>, Vec<u8>)) -> (Vec<u8>, Accumulation) {
    match Leaf::decode(&value) {
        Ok(leaf) => leaf.into_parts(),
        Err(err) => panic!("corrupt leaf record at {}: {err}", hex::encode(&raw)),
    }
}
