//! Ordered byte key-value stores.

use std::collections::BTreeMap;
use tracing::debug;

/// A key/value pair returned by a prefix scan.
pub type Entry = (Vec<u8>, Vec<u8>);

/// Read access to an ordered key-value store.
pub trait KvRead {
    /// Returns the value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Returns every entry whose key starts with `prefix`, in key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<Entry>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }
}

/// Write access to an ordered key-value store.
pub trait KvStore: KvRead {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);
}

impl<T: KvRead + ?Sized> KvRead for &T {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<Entry> {
        (**self).prefix_scan(prefix)
    }
}

impl<T: KvRead + ?Sized> KvRead for &mut T {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<Entry> {
        (**self).prefix_scan(prefix)
    }
}

impl<T: KvStore + ?Sized> KvStore for &mut T {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        (**self).set(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        (**self).delete(key);
    }
}

/// In-memory store backed by a `BTreeMap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvRead for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<Entry> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl KvStore for MemoryStore {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }
}

/// Pending writes over a read-only parent store.
///
/// Reads see the pending writes first. Nothing reaches the parent until
/// [`CacheStore::into_changes`] is applied; dropping the cache discards every
/// write.
#[derive(Debug)]
pub struct CacheStore<'a, S: KvRead + ?Sized> {
    parent: &'a S,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: KvRead + ?Sized> CacheStore<'a, S> {
    pub fn new(parent: &'a S) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// True when at least one write is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Releases the parent and returns the pending writes.
    #[must_use]
    pub fn into_changes(self) -> ChangeSet {
        ChangeSet {
            writes: self.writes,
        }
    }
}

impl<S: KvRead + ?Sized> KvRead for CacheStore<'_, S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(pending) => pending.clone(),
            None => self.parent.get(key),
        }
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Vec<Entry> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.prefix_scan(prefix).into_iter().collect();
        let pending = self
            .writes
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, value) in pending {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

impl<S: KvRead + ?Sized> KvStore for CacheStore<'_, S> {
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }
}

/// Writes collected by a [`CacheStore`], ready to be applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl ChangeSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Applies every write to `store` in key order.
    pub fn apply<S: KvStore + ?Sized>(self, store: &mut S) {
        debug!(writes = self.writes.len(), "Applying change set");
        for (key, value) in self.writes {
            match value {
                Some(v) => store.set(key, v),
                None => store.delete(&key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(entries: &[(&str, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (k, v) in entries {
            store.set(k.as_bytes().to_vec(), v.as_bytes().to_vec());
        }
        store
    }

    fn keys(entries: &[Entry]) -> Vec<String> {
        entries
            .iter()
            .map(|(k, _)| String::from_utf8_lossy(k).into_owned())
            .collect()
    }

    #[test]
    fn test_memory_store_get_set_delete() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());

        store.set(b"a".to_vec(), b"1".to_vec());
        assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
        assert!(store.has(b"a"));

        store.set(b"a".to_vec(), b"2".to_vec());
        assert_eq!(store.get(b"a"), Some(b"2".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete(b"a");
        assert_eq!(store.get(b"a"), None);
        store.delete(b"missing");
        assert!(store.is_empty());
    }

    #[test]
    fn test_prefix_scan_is_ordered_and_bounded() {
        let store = store_with(&[("p/b", "2"), ("p/a", "1"), ("q/a", "3"), ("p", "0")]);

        assert_eq!(keys(&store.prefix_scan(b"p/")), vec!["p/a", "p/b"]);
        assert_eq!(keys(&store.prefix_scan(b"p")), vec!["p", "p/a", "p/b"]);
        assert!(store.prefix_scan(b"z").is_empty());
        assert_eq!(store.prefix_scan(b"").len(), 4);
    }

    #[test]
    fn test_cache_reads_through_and_overlays() {
        let parent = store_with(&[("p/a", "1"), ("p/b", "2"), ("p/c", "3")]);
        let mut cache = CacheStore::new(&parent);
        assert!(!cache.is_dirty());

        assert_eq!(cache.get(b"p/a"), Some(b"1".to_vec()));

        cache.set(b"p/a".to_vec(), b"10".to_vec());
        cache.delete(b"p/b");
        cache.set(b"p/d".to_vec(), b"4".to_vec());
        assert!(cache.is_dirty());

        assert_eq!(cache.get(b"p/a"), Some(b"10".to_vec()));
        assert_eq!(cache.get(b"p/b"), None);
        assert_eq!(keys(&cache.prefix_scan(b"p/")), vec!["p/a", "p/c", "p/d"]);

        // parent untouched until applied
        assert_eq!(parent.get(b"p/a"), Some(b"1".to_vec()));
        assert_eq!(parent.get(b"p/d"), None);
    }

    #[test]
    fn test_change_set_apply_and_discard() {
        let mut parent = store_with(&[("a", "1"), ("b", "2")]);

        let mut cache = CacheStore::new(&parent);
        cache.set(b"c".to_vec(), b"3".to_vec());
        drop(cache);
        assert_eq!(parent.get(b"c"), None);

        let mut cache = CacheStore::new(&parent);
        cache.set(b"a".to_vec(), b"9".to_vec());
        cache.delete(b"b");
        cache.set(b"c".to_vec(), b"3".to_vec());
        let changes = cache.into_changes();
        assert_eq!(changes.len(), 3);

        changes.apply(&mut parent);
        assert_eq!(parent, store_with(&[("a", "9"), ("c", "3")]));
    }

    #[test]
    fn test_nested_cache() {
        let parent = store_with(&[("a", "1")]);
        let mut outer = CacheStore::new(&parent);
        outer.set(b"b".to_vec(), b"2".to_vec());

        let mut inner = CacheStore::new(&outer);
        inner.delete(b"a");
        assert_eq!(inner.get(b"b"), Some(b"2".to_vec()));
        assert!(inner.prefix_scan(b"").iter().all(|(k, _)| k != b"a"));

        let changes = inner.into_changes();
        changes.apply(&mut outer);
        assert_eq!(keys(&outer.prefix_scan(b"")), vec!["b"]);
    }
}
