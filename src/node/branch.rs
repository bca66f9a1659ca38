use std::fmt::Display;

use bytes::{Buf, BufMut};

use super::{get_accumulation, get_bytes, put_accumulation, put_bytes, Accumulation};
use crate::error::DecodeError;

/// One entry of a branch: the key the child node is stored under, and the
/// exact accumulation total of that child's subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    index: Vec<u8>,
    accumulation: Accumulation,
}

impl Child {
    pub fn new(index: Vec<u8>, accumulation: Accumulation) -> Self {
        Self {
            index,
            accumulation,
        }
    }

    pub fn index(&self) -> &[u8] {
        &self.index
    }

    pub fn accumulation(&self) -> Accumulation {
        self.accumulation
    }
}

impl Display for Child {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Child {{ index: {}, accumulation: {} }}",
            hex::encode(&self.index),
            self.accumulation
        )
    }
}

/// A branch holds between 1 and m children, sorted ascending by index with
/// no duplicates. Child indices never order below the key the branch itself
/// is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    children: Vec<Child>,
}

impl Branch {
    /// Builds a branch over `children`, which must already be in index
    /// order.
    pub fn new(children: Vec<Child>) -> Self {
        Self { children }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Locates `index` among the children: `(position, true)` on an exact
    /// match, `(insertion point, false)` otherwise.
    pub fn find(&self, index: &[u8]) -> (usize, bool) {
        match self
            .children
            .binary_search_by(|child| child.index.as_slice().cmp(index))
        {
            Ok(at) => (at, true),
            Err(at) => (at, false),
        }
    }

    pub fn insert(&mut self, at: usize, child: Child) {
        self.children.insert(at, child);
    }

    pub fn remove(&mut self, at: usize) -> Child {
        self.children.remove(at)
    }

    pub fn set_accumulation(&mut self, at: usize, accumulation: Accumulation) {
        self.children[at].accumulation = accumulation;
    }

    /// Splits off the children from `at` onward, leaving the lower half in
    /// place.
    pub fn split_off(&mut self, at: usize) -> Branch {
        Branch {
            children: self.children.split_off(at),
        }
    }

    /// Appends every child of `right`, which must be the adjacent sibling in
    /// key order.
    pub fn merge(&mut self, right: Branch) {
        self.children.extend(right.children);
    }

    /// Total accumulation over the children.
    ///
    /// # Panics
    ///
    /// On arithmetic overflow, which only a corrupted store can produce.
    pub fn accumulation(&self) -> Accumulation {
        self.children
            .iter()
            .fold(Accumulation::ZERO, |total, child| {
                match total.checked_add(child.accumulation) {
                    Some(total) => total,
                    None => panic!("accumulation overflow folding {child}"),
                }
            })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(2 + self.children.len() * (4 + super::ACCUMULATION_BYTES));
        buf.put_u16(self.children.len() as u16);
        for child in &self.children {
            put_bytes(&mut buf, &child.index);
            put_accumulation(&mut buf, child.accumulation);
        }
        buf
    }

    pub fn decode(mut bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.remaining() < 2 {
            return Err(DecodeError::Truncated {
                context: "branch child count",
                needed: 2 - bytes.remaining(),
            });
        }
        let count = bytes.get_u16() as usize;
        if count == 0 {
            return Err(DecodeError::EmptyBranch);
        }
        let mut children = Vec::with_capacity(count);
        for _ in 0..count {
            let index = get_bytes(&mut bytes, "child index")?;
            let accumulation = get_accumulation(&mut bytes, "child accumulation")?;
            children.push(Child {
                index,
                accumulation,
            });
        }
        super::ensure_consumed(bytes)?;
        Ok(Self { children })
    }
}

impl Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Branch {{ children: {}, accumulation: {} }}",
            self.children.len(),
            self.accumulation()
        )
    }
}
