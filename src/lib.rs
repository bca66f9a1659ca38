//! Accumulation-augmented B+-tree over ordered key-value storage
//!
//! This crate keeps a running sum for every subtree of a B+-tree laid out
//! inside any ordered key-value store, so prefix sums and range sums over a
//! dynamic set of `(key, weight)` pairs cost O(log n) store accesses, as do
//! point updates.
//!
//! The tree supports:
//! - Point upserts and deletes with eager aggregate propagation
//! - Prefix, range and three-way split queries over the weights
//! - Node splitting on overflow and sibling merging on emptied nodes
//! - Flexible storage backend through the [`KvStore`] trait
//!
//! No parent or child addresses are ever stored; every relation is derived
//! from lexicographic key structure, which makes the tree a pure function of
//! the store contents.

mod error;
mod key;
mod node;
mod store;
mod tree;

pub use error::DecodeError;
pub use node::{Accumulation, Branch, Child, Leaf};
pub use store::{prefix_end, KvStore, MemoryStore, PrefixStore};
pub use tree::{AccumulationSplit, Tree, DEFAULT_BRANCHING_FACTOR};

#[cfg(test)]
mod tests;
