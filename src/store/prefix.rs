use super::{prefix_end, KvStore};

/// Scopes a shared store down to one prefix, giving the wrapped keyspace the
/// exclusivity the tree's [`KvStore`] contract asks for. Keys are prefixed
/// on the way in and stripped on the way out, so the tree never sees a
/// neighbor's records.
#[derive(Debug, Clone)]
pub struct PrefixStore<S> {
    inner: S,
    prefix: Vec<u8>,
}

impl<S: KvStore> PrefixStore<S> {
    pub fn new(inner: S, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn scoped(&self, key: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.prefix.len() + key.len());
        out.extend_from_slice(&self.prefix);
        out.extend_from_slice(key);
        out
    }

    fn scan_bounds(&self, start: &[u8], end: Option<&[u8]>) -> (Vec<u8>, Option<Vec<u8>>) {
        let end = match end {
            Some(end) => Some(self.scoped(end)),
            None => prefix_end(&self.prefix),
        };
        (self.scoped(start), end)
    }
}

impl<S: KvStore> KvStore for PrefixStore<S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(&self.scoped(key))
    }

    fn has(&self, key: &[u8]) -> bool {
        self.inner.has(&self.scoped(key))
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        let key = self.scoped(key);
        self.inner.set(&key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        let key = self.scoped(key);
        self.inner.delete(&key);
    }

    fn iter<'a>(
        &'a self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        let (start, end) = self.scan_bounds(start, end);
        let cut = self.prefix.len();
        let prefix = self.prefix.clone();
        Box::new(
            self.inner
                .iter(&start, end.as_deref())
                .take_while(move |(key, _)| key.starts_with(&prefix))
                .map(move |(key, value)| (key[cut..].to_vec(), value)),
        )
    }

    fn iter_rev<'a>(
        &'a self,
        start: &[u8],
        end: Option<&[u8]>,
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        let (start, end) = self.scan_bounds(start, end);
        let cut = self.prefix.len();
        let prefix = self.prefix.clone();
        Box::new(
            self.inner
                .iter_rev(&start, end.as_deref())
                .take_while(move |(key, _)| key.starts_with(&prefix))
                .map(move |(key, value)| (key[cut..].to_vec(), value)),
        )
    }
}
