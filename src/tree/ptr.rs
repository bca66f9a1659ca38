//! Node locators and the recursive machinery behind mutations and queries.
//!
//! A node's position is fully described by `(level, key)`. Nothing in the
//! store records parent or child addresses; every relation is recovered on
//! demand from key order, one bounded scan per step, and each scan is
//! dropped as soon as the single pointer of interest is out. That keeps the
//! shape of the tree a pure function of the store contents and rules out
//! dangling references by construction.

use std::cmp::Ordering;
use std::fmt::Display;

use tracing::trace;

use crate::key;
use crate::node::{Branch, Child, Leaf};
use crate::store::{prefix_end, KvStore};

use super::{AccumulationSplit, Tree};

/// Ephemeral locator of one node. Never persisted; recomputed fresh on
/// every traversal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct NodePtr {
    pub(super) level: u16,
    pub(super) key: Vec<u8>,
}

impl NodePtr {
    pub(super) fn new(level: u16, key: Vec<u8>) -> Self {
        Self { level, key }
    }

    pub(super) fn leaf(key: Vec<u8>) -> Self {
        Self::new(0, key)
    }

    fn store_key(&self) -> Vec<u8> {
        key::node_key(self.level, &self.key)
    }
}

impl Display for NodePtr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.level, hex::encode(&self.key))
    }
}

fn ptr_from_store_key(raw: &[u8]) -> NodePtr {
    match key::parse_node_key(raw) {
        Ok((level, key)) => NodePtr::new(level, key.to_vec()),
        Err(err) => panic!("corrupt store key {}: {err}", hex::encode(raw)),
    }
}

impl<S: KvStore> Tree<S> {
    pub(super) fn node_exists(&self, ptr: &NodePtr) -> bool {
        self.store.has(&ptr.store_key())
    }

    /// Decoded branch at `ptr`, `None` when nothing is stored there.
    pub(super) fn branch_at(&self, ptr: &NodePtr) -> Option<Branch> {
        let raw = self.store.get(&ptr.store_key())?;
        match Branch::decode(&raw) {
            Ok(node) => Some(node),
            Err(err) => panic!("corrupt branch record at {ptr}: {err}"),
        }
    }

    /// Branch at `ptr`, which the caller knows must exist.
    pub(super) fn must_branch(&self, ptr: &NodePtr) -> Branch {
        match self.branch_at(ptr) {
            Some(node) => node,
            None => panic!("missing branch record at {ptr}"),
        }
    }

    /// Decoded leaf record for `key`, `None` when the key was never set.
    pub(super) fn leaf_record(&self, key: &[u8]) -> Option<Leaf> {
        let raw = self.store.get(&key::leaf_key(key))?;
        match Leaf::decode(&raw) {
            Ok(leaf) => Some(leaf),
            Err(err) => panic!("corrupt leaf record at 0:{}: {err}", hex::encode(key)),
        }
    }

    pub(super) fn write_leaf(&mut self, leaf: &Leaf) {
        self.store.set(&key::leaf_key(leaf.key()), leaf.encode());
    }

    fn write_branch(&mut self, ptr: &NodePtr, node: &Branch) {
        self.store.set(&ptr.store_key(), node.encode());
    }

    pub(super) fn delete_node(&mut self, ptr: &NodePtr) {
        self.store.delete(&ptr.store_key());
    }

    /// First existing node at `level` with key at least `from`.
    fn first_node_at(&self, level: u16, from: &[u8]) -> Option<NodePtr> {
        let start = key::node_key(level, from);
        let end = prefix_end(&key::level_prefix(level));
        let mut scan = self.store.iter(&start, end.as_deref());
        scan.next().map(|(raw, _)| ptr_from_store_key(&raw))
    }

    /// Last existing node at `level` with key strictly below `below`.
    fn last_node_before(&self, level: u16, below: &[u8]) -> Option<NodePtr> {
        let start = key::level_prefix(level);
        let end = key::node_key(level, below);
        let mut scan = self.store.iter_rev(&start, Some(&end));
        scan.next().map(|(raw, _)| ptr_from_store_key(&raw))
    }

    fn left_sibling(&self, ptr: &NodePtr) -> Option<NodePtr> {
        self.last_node_before(ptr.level, &ptr.key)
    }

    /// Nearest existing node to the right at the same level, skipping the
    /// node itself when it is still stored.
    fn right_sibling(&self, ptr: &NodePtr) -> Option<NodePtr> {
        let start = ptr.store_key();
        let end = prefix_end(&key::level_prefix(ptr.level));
        let mut scan = self.store.iter(&start, end.as_deref());
        let nearest = ptr_from_store_key(&scan.next()?.0);
        if nearest.key == ptr.key {
            scan.next().map(|(raw, _)| ptr_from_store_key(&raw))
        } else {
            Some(nearest)
        }
    }

    /// Locator of the node one level up that holds (or would hold) this
    /// node's summary: the same-key node if one exists, else the nearest
    /// node keyed below, else the would-be first node of that level. The
    /// result may not exist yet; `push` into it grows the tree.
    pub(super) fn parent_of(&self, ptr: &NodePtr) -> NodePtr {
        let above = NodePtr::new(ptr.level + 1, ptr.key.clone());
        if self.node_exists(&above) {
            return above;
        }
        if let Some(sibling) = self.left_sibling(&above) {
            return sibling;
        }
        NodePtr::new(ptr.level + 1, Vec::new())
    }

    /// Locator of the child recorded at `index`, recovered by a one-step
    /// scan at the level below.
    pub(super) fn child_of(&self, ptr: &NodePtr, index: &[u8]) -> Option<NodePtr> {
        if ptr.level == 0 {
            return None;
        }
        self.first_node_at(ptr.level - 1, index)
    }

    /// The root: the highest-level node in the subspace, found with one
    /// reverse scan. `None` only when the store holds no records at all.
    pub(super) fn root_ptr(&self) -> Option<NodePtr> {
        let end = prefix_end(key::NODE_PREFIX);
        let mut scan = self.store.iter_rev(key::NODE_PREFIX, end.as_deref());
        scan.next().map(|(raw, _)| ptr_from_store_key(&raw))
    }

    /// Records `child` under the node at `ptr` and restores every ancestor
    /// aggregate: creates the node when absent, rewrites the matching entry
    /// when the index is already present, splits on overflow.
    pub(super) fn push(&mut self, ptr: &NodePtr, child: Child) {
        let Some(mut node) = self.branch_at(ptr) else {
            // nothing stored here yet; a fresh one-child branch, which is
            // also how the tree grows a level above the old root
            trace!(level = ptr.level, key = %hex::encode(&ptr.key), "starting branch level");
            self.write_branch(ptr, &Branch::new(vec![child]));
            return;
        };

        let (at, found) = node.find(child.index());
        if found {
            self.update_accumulation(ptr, child);
            return;
        }
        node.insert(at, child);

        let parent = self.parent_of(ptr);
        if node.len() <= usize::from(self.m) {
            self.write_branch(ptr, &node);
            self.update_accumulation(&parent, Child::new(ptr.key.clone(), node.accumulation()));
            return;
        }

        // overflow: keep the lower half here, re-key the upper half at its
        // first entry
        let upper = node.split_off(usize::from(self.m) / 2 + 1);
        let upper_key = upper.children()[0].index().to_vec();
        let upper_ptr = NodePtr::new(ptr.level, upper_key.clone());
        trace!(
            level = ptr.level,
            key = %hex::encode(&ptr.key),
            at = %hex::encode(&upper_key),
            "splitting branch"
        );
        self.write_branch(ptr, &node);
        self.write_branch(&upper_ptr, &upper);

        let lower_summary = Child::new(ptr.key.clone(), node.accumulation());
        let upper_summary = Child::new(upper_key, upper.accumulation());
        if self.node_exists(&parent) {
            // settle the lower entry first: pushing the upper summary can
            // split the parent and move this key into the new sibling
            self.update_accumulation(&parent, lower_summary);
            self.push(&parent, upper_summary);
        } else {
            // splitting the root: both halves seed the new top level at once
            trace!(level = parent.level, "starting branch level");
            self.write_branch(&parent, &Branch::new(vec![lower_summary, upper_summary]));
        }
    }

    /// Rewrites one child summary and re-aggregates upward. A missing node
    /// ends the recursion: the previous level was the root.
    fn update_accumulation(&mut self, ptr: &NodePtr, child: Child) {
        let Some(mut node) = self.branch_at(ptr) else {
            return;
        };
        let (at, found) = node.find(child.index());
        if !found {
            panic!(
                "no child {} recorded under {ptr}",
                hex::encode(child.index())
            );
        }
        node.set_accumulation(at, child.accumulation());
        self.write_branch(ptr, &node);

        let parent = self.parent_of(ptr);
        self.update_accumulation(&parent, Child::new(ptr.key.clone(), node.accumulation()));
    }

    /// Removes the child summary at `index` from the node at `ptr`. A node
    /// left empty is deleted and pulled from its own parent in turn; the
    /// siblings it sat between are then merged when they fit in one node.
    pub(super) fn pull(&mut self, ptr: &NodePtr, index: &[u8]) {
        let Some(mut node) = self.branch_at(ptr) else {
            return;
        };
        let (at, found) = node.find(index);
        if !found {
            panic!("no child {} recorded under {ptr}", hex::encode(index));
        }
        node.remove(at);

        if !node.is_empty() {
            self.write_branch(ptr, &node);
            let parent = self.parent_of(ptr);
            self.update_accumulation(&parent, Child::new(ptr.key.clone(), node.accumulation()));
            return;
        }

        trace!(level = ptr.level, key = %hex::encode(&ptr.key), "removing emptied branch");
        let parent = self.parent_of(ptr);
        self.delete_node(ptr);
        self.pull(&parent, &ptr.key);

        // best effort: the removal made two nodes adjacent, fold them
        // together when they share a parent and fit in one node
        let (Some(left), Some(right)) = (self.left_sibling(ptr), self.right_sibling(ptr)) else {
            return;
        };
        let parent = self.parent_of(&left);
        if parent != self.parent_of(&right) {
            return;
        }
        let mut lower = self.must_branch(&left);
        let upper = self.must_branch(&right);
        if lower.len() + upper.len() >= usize::from(self.m) {
            return;
        }
        trace!(
            level = left.level,
            left = %hex::encode(&left.key),
            right = %hex::encode(&right.key),
            "merging sibling branches"
        );
        lower.merge(upper);
        self.write_branch(&left, &lower);
        self.delete_node(&right);
        self.pull(&parent, &right.key);
        self.update_accumulation(&parent, Child::new(left.key.clone(), lower.accumulation()));
    }

    /// Partitions the total below `ptr` around `key` in one descent. Exactly
    /// one child per level is entered; aggregates of untouched siblings are
    /// taken straight from their recorded summaries, which keeps the whole
    /// query logarithmic.
    pub(super) fn accumulation_split(&self, ptr: &NodePtr, key: &[u8]) -> AccumulationSplit {
        if ptr.level == 0 {
            let Some(leaf) = self.leaf_record(&ptr.key) else {
                panic!("missing leaf record at {ptr}");
            };
            let mut split = AccumulationSplit::ZERO;
            match ptr.key.as_slice().cmp(key) {
                Ordering::Less => split.left = leaf.accumulation(),
                Ordering::Equal => split.exact = leaf.accumulation(),
                Ordering::Greater => split.right = leaf.accumulation(),
            }
            return split;
        }

        let node = self.must_branch(ptr);
        let (at, found) = node.find(key);
        // the child subtree that can contain the key: the exact match, else
        // the nearest child keyed below it; -1 puts every child to the right
        let into = if found { at as isize } else { at as isize - 1 };

        let mut split = AccumulationSplit::ZERO;
        for (position, child) in node.children().iter().enumerate() {
            match (position as isize).cmp(&into) {
                Ordering::Less => split.left += child.accumulation(),
                Ordering::Equal => {
                    let below = NodePtr::new(ptr.level - 1, child.index().to_vec());
                    let inner = self.accumulation_split(&below, key);
                    split.left += inner.left;
                    split.exact = inner.exact;
                    split.right += inner.right;
                }
                Ordering::Greater => split.right += child.accumulation(),
            }
        }
        split
    }
}
