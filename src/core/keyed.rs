//! Identity keys and key-indexed item sets.
//!
//! Reconciliation never compares items structurally. Every item projects a
//! string identity key, and two items are the same real-world entity exactly
//! when their keys are equal.

use std::collections::BTreeMap;

/// An item that can take part in reconciliation.
///
/// The key must be a pure function of the item's own fields: computing it
/// never mutates the item and always yields the same value for the same field
/// contents.
pub trait Keyed {
    /// Stable identity key for this item.
    fn identity_key(&self) -> String;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn identity_key(&self) -> String {
        (**self).identity_key()
    }
}

impl<T: Keyed + ?Sized> Keyed for Box<T> {
    fn identity_key(&self) -> String {
        (**self).identity_key()
    }
}

/// A set of items with no duplicate identity keys.
///
/// Iteration is ordered by identity key so output derived from a set is
/// reproducible regardless of input order.
#[derive(Debug, Clone)]
pub struct KeyedSet<T> {
    items: BTreeMap<String, T>,
}

impl<T> Default for KeyedSet<T> {
    fn default() -> Self {
        Self { items: BTreeMap::new() }
    }
}

impl<T: Keyed> KeyedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a sequence of items.
    ///
    /// When two items share a key the later one replaces the earlier one.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Insert an item, returning the item it replaced if the key was present.
    pub fn insert(&mut self, item: T) -> Option<T> {
        self.items.insert(item.identity_key(), item)
    }

    /// Whether an item with the same identity key is present.
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains_key(&item.identity_key())
    }
}

impl<T> KeyedSet<T> {
    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Look up an item by identity key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Identity keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Items in key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Remove and return the item stored under `key`.
    pub(crate) fn take(&mut self, key: &str) -> Option<T> {
        self.items.remove(key)
    }

    /// Consume the set, yielding items in key order.
    pub fn into_items(self) -> Vec<T> {
        self.items.into_values().collect()
    }
}

impl<T: Keyed> FromIterator<T> for KeyedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl<T> IntoIterator for KeyedSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_map::IntoValues<String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}
