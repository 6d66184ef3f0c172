//! Insertion-ordered, first-write-wins hash index.
//!
//! The canonical registries must iterate in registration order so that the
//! generated output is deterministic, and the first value registered for a
//! hash must never be replaced. [`CanonicalMap`] keeps an `FxHashMap` for O(1)
//! lookup plus an ordered key list for iteration.

use rustc_hash::FxHashMap;

use hostabi_core::ContentHash;

/// Hash-indexed map where the first insert for a key wins.
#[derive(Debug, Clone)]
pub struct CanonicalMap<V> {
    by_hash: FxHashMap<ContentHash, V>,
    order: Vec<ContentHash>,
}

impl<V> Default for CanonicalMap<V> {
    fn default() -> Self {
        Self {
            by_hash: FxHashMap::default(),
            order: Vec::new(),
        }
    }
}

impl<V> CanonicalMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` unless `hash` is already present.
    ///
    /// Returns `true` if the value was inserted.
    pub fn insert_if_absent(&mut self, hash: ContentHash, value: V) -> bool {
        if self.by_hash.contains_key(&hash) {
            return false;
        }
        self.by_hash.insert(hash, value);
        self.order.push(hash);
        true
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&V> {
        self.by_hash.get(hash)
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ContentHash, &V)> + '_ {
        self.order.iter().map(move |hash| (*hash, &self.by_hash[hash]))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = ContentHash> + '_ {
        self.order.iter().copied()
    }
}
