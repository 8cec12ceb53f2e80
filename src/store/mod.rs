//! Ordered key/value storage for headers, transport options and cookies.
//!
//! [`KeyValueStore`] is the one mapping type the crate uses for every bag of
//! settings. It keeps entries in insertion order, lets the last write to a
//! key win, can fold key case so that `Content-Type` and `content-type`
//! resolve to the same slot, and can be frozen into a read-only snapshot.
//!
//! # Examples
//!
//! ```rust
//! use curlish::store::HeaderStore;
//!
//! let mut headers = HeaderStore::case_insensitive();
//! headers.set("Content-Type", "application/json")?;
//! assert_eq!(headers.get("content-type").map(String::as_str), Some("application/json"));
//!
//! let snapshot = headers.snapshot();
//! assert!(snapshot.is_frozen());
//! # Ok::<(), curlish::Error>(())
//! ```

use crate::error::{Error, Result};

use std::borrow::Borrow;
use std::fmt::Debug;

/// Key comparison used by [`KeyValueStore`].
///
/// `case_fold` is only meaningful for textual keys; enumerated keys ignore it.
pub trait SlotKey {
    /// Whether `self` and `other` address the same slot.
    fn same_slot(&self, other: &Self, case_fold: bool) -> bool;
}

impl SlotKey for str {
    fn same_slot(&self, other: &Self, case_fold: bool) -> bool {
        if case_fold {
            self.eq_ignore_ascii_case(other)
        } else {
            self == other
        }
    }
}

impl SlotKey for String {
    fn same_slot(&self, other: &Self, case_fold: bool) -> bool {
        self.as_str().same_slot(other.as_str(), case_fold)
    }
}

/// Ordered mapping with optional case folding and an optional frozen mode.
#[derive(Debug, Clone)]
pub struct KeyValueStore<K, V> {
    entries: Vec<(K, V)>,
    case_fold: bool,
    frozen: bool,
}

/// Header storage: textual keys matched case-insensitively.
pub type HeaderStore = KeyValueStore<String, String>;

impl<K, V> Default for KeyValueStore<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            case_fold: false,
            frozen: false,
        }
    }
}

impl<K: SlotKey + Clone + Debug, V: Clone + Debug> KeyValueStore<K, V> {
    /// Creates an empty, mutable store with exact key matching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty, mutable store that folds key case on every path.
    pub fn case_insensitive() -> Self {
        Self {
            case_fold: true,
            ..Self::default()
        }
    }

    /// Creates a store seeded from `entries`.
    ///
    /// Duplicate keys collapse with the last one winning, as with [`set`].
    ///
    /// [`set`]: KeyValueStore::set
    pub fn from_entries<I, KK, VV>(entries: I, case_fold: bool, frozen: bool) -> Self
    where
        I: IntoIterator<Item = (KK, VV)>,
        KK: Into<K>,
        VV: Into<V>,
    {
        let mut store = Self {
            entries: Vec::new(),
            case_fold,
            frozen: false,
        };
        for (key, value) in entries {
            store.upsert(key.into(), value.into());
        }
        store.frozen = frozen;
        store
    }

    /// Whether mutations are rejected.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Whether keys are matched case-insensitively.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_fold
    }

    /// Sets a single key.
    pub fn set(&mut self, key: impl Into<K>, value: impl Into<V>) -> Result<()> {
        self.ensure_mutable()?;
        self.upsert(key.into(), value.into());
        Ok(())
    }

    /// Sets every pair of `entries`, in order.
    pub fn extend<I, KK, VV>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (KK, VV)>,
        KK: Into<K>,
        VV: Into<V>,
    {
        self.ensure_mutable()?;
        for (key, value) in entries {
            self.upsert(key.into(), value.into());
        }
        Ok(())
    }

    /// Removes a key, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>>
    where
        K: Borrow<Q>,
        Q: SlotKey + ?Sized,
    {
        self.ensure_mutable()?;
        Ok(self
            .position(key)
            .map(|index| self.entries.remove(index).1))
    }

    /// Returns the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: SlotKey + ?Sized,
    {
        self.position(key).map(|index| &self.entries[index].1)
    }

    /// Returns the value stored under `key`, or `default` when it is missing.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: SlotKey + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    /// Looks up several keys at once; each missing key resolves to `default`.
    pub fn get_many<'k, 'a, Q>(&'a self, keys: &[&'k Q], default: &'a V) -> Vec<(&'k Q, &'a V)>
    where
        K: Borrow<Q>,
        Q: SlotKey + ?Sized,
    {
        keys.iter()
            .map(|key| (*key, self.get_or(*key, default)))
            .collect()
    }

    /// Whether `key` has a value.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: SlotKey + ?Sized,
    {
        self.position(key).is_some()
    }

    /// Every entry, in insertion order.
    pub fn all(&self) -> &[(K, V)] {
        &self.entries
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the store. Frozen stores are left untouched.
    pub fn clear(&mut self) {
        if !self.frozen {
            self.entries.clear();
        }
    }

    /// Read-only copy of the current contents, decoupled from `self`.
    pub fn snapshot(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            case_fold: self.case_fold,
            frozen: true,
        }
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::FrozenStore);
        }
        Ok(())
    }

    fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: SlotKey + ?Sized,
    {
        self.entries
            .iter()
            .position(|(existing, _)| Borrow::<Q>::borrow(existing).same_slot(key, self.case_fold))
    }

    fn upsert(&mut self, key: K, value: V) {
        match self
            .entries
            .iter()
            .position(|(existing, _)| existing.same_slot(&key, self.case_fold))
        {
            Some(index) => self.entries[index] = (key, value),
            None => self.entries.push((key, value)),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a KeyValueStore<K, V> {
    type Item = &'a (K, V);
    type IntoIter = std::slice::Iter<'a, (K, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
