//! Ordered key-value storage the tree runs on.

mod memory;
mod prefix;

pub use memory::MemoryStore;
pub use prefix::PrefixStore;

/// Ordered byte-keyed storage backend.
///
/// The tree requires an exclusive sub-keyspace of whatever store backs it;
/// wrap a shared store in [`PrefixStore`] to carve one out. Scans cover
/// `[start, end)`: `start` inclusive, `end` exclusive, `None` unbounded.
/// Callers keep `start <= end` whenever both are given.
///
/// Absence is represented in the types (`Option`, no-op deletes); backends
/// with fallible I/O surface failures through their own layer rather than
/// through this trait.
pub trait KvStore {
    /// Value stored at `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Whether `key` holds a value.
    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` at `key`, replacing any previous value.
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// Removes `key`; absent keys are a no-op.
    fn delete(&mut self, key: &[u8]);

    /// Ascending scan over `[start, end)`.
    fn iter<'a>(
        &'a self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

    /// Descending scan over `[start, end)`.
    fn iter_rev<'a>(
        &'a self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn has(&self, key: &[u8]) -> bool {
        (**self).has(key)
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        (**self).set(key, value)
    }

    fn delete(&mut self, key: &[u8]) {
        (**self).delete(key)
    }

    fn iter<'a>(
        &'a self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        (**self).iter(start, end)
    }

    fn iter_rev<'a>(
        &'a self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        (**self).iter_rev(start, end)
    }
}

/// Exclusive upper bound of a scan over every key starting with `prefix`:
/// the last byte below 0xFF is incremented and the tail dropped. `None` when
/// no upper bound exists (empty or all-0xFF prefixes).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let bump = prefix.iter().rposition(|&b| b != u8::MAX)?;
    let mut end = prefix[..=bump].to_vec();
    end[bump] += 1;
    Some(end)
}
