//! Keyed storage of per-group state.
//!
//! [`KeyedStore`] maps a group [`Key`] to a slot of state (an accumulator row,
//! a last-seen value, ...). Slots live in an arena and are addressed through
//! stable [`Handle`]s; a slot is created the first time its key is written and
//! is never moved or removed afterwards.
//!
//! # Memory
//!
//! There is no eviction. The store holds one slot per distinct key ever
//! written, for as long as the owning transformer lives. Deployments with
//! unbounded key cardinality must cap or partition keys upstream.
//!
//! # Concurrency
//!
//! The store is plain owned data (`Send` when `S` is) with no locking. Run
//! parallel streams by sharding on the key, one store per shard.

use crate::feature_extraction::error::FeatureError;
use crate::sample::Key;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable index of a slot inside one [`KeyedStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(usize);

/// Arena-backed map from group key to state.
#[derive(Clone, Debug)]
pub struct KeyedStore<S> {
    index: HashMap<Key, Handle>,
    slots: Vec<(Key, S)>,
}

impl<S> Default for KeyedStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> KeyedStore<S> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
        }
    }

    /// Slot for `key`, created with `init` on first access.
    ///
    /// Every later call with an equal key returns the same slot.
    pub fn get_or_create<F: FnOnce() -> S>(&mut self, key: Key, init: F) -> &mut S {
        let handle = match self.index.get(&key) {
            Some(&handle) => handle,
            None => {
                let handle = Handle(self.slots.len());
                log::trace!("new key slot {:?} -> {:?}", key, handle);
                self.index.insert(key.clone(), handle);
                self.slots.push((key, init()));
                handle
            }
        };
        &mut self.slots[handle.0].1
    }

    /// Slot for `key` if it exists. Never creates.
    pub fn get(&self, key: &Key) -> Option<&S> {
        self.index.get(key).map(|h| &self.slots[h.0].1)
    }

    pub fn handle(&self, key: &Key) -> Option<Handle> {
        self.index.get(key).copied()
    }

    /// Slot behind a handle obtained from this store.
    pub fn slot(&self, handle: Handle) -> Option<&S> {
        self.slots.get(handle.0).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key/slot pairs in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &S)> {
        self.slots.iter().map(|(k, s)| (k, s))
    }
}

/// Serializable image of a [`KeyedStore`]: every key with its slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyedStoreParams<S> {
    pub entries: Vec<(Key, S)>,
}

impl<S: Clone> KeyedStore<S> {
    pub fn extract_params(&self) -> KeyedStoreParams<S> {
        KeyedStoreParams {
            entries: self.slots.clone(),
        }
    }
}

impl<S> KeyedStore<S> {
    /// Rebuild a store; creation order and handles are preserved.
    pub fn from_params(params: KeyedStoreParams<S>) -> Result<Self, FeatureError> {
        let mut index = HashMap::with_capacity(params.entries.len());
        for (i, (key, _)) in params.entries.iter().enumerate() {
            if index.insert(key.clone(), Handle(i)).is_some() {
                return Err(FeatureError::Serialization(format!(
                    "duplicate key {:?} in stored state",
                    key
                )));
            }
        }
        Ok(Self {
            index,
            slots: params.entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Key {
        Key::from_values(&[s])
    }

    #[test]
    fn test_get_or_create_returns_same_slot() {
        let mut store: KeyedStore<u32> = KeyedStore::new();
        *store.get_or_create(key("a"), || 0) += 1;
        *store.get_or_create(key("a"), || 100) += 1;
        assert_eq!(store.get(&key("a")), Some(&2));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_does_not_create() {
        let store: KeyedStore<u32> = KeyedStore::new();
        assert_eq!(store.get(&key("missing")), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_handles_are_stable() {
        let mut store: KeyedStore<&'static str> = KeyedStore::new();
        store.get_or_create(key("a"), || "first");
        let h = store.handle(&key("a")).unwrap();
        for i in 0..100 {
            store.get_or_create(Key::from_values(&[i]), || "other");
        }
        assert_eq!(store.handle(&key("a")), Some(h));
        assert_eq!(store.slot(h), Some(&"first"));
    }

    #[test]
    fn test_iter_in_creation_order() {
        let mut store: KeyedStore<u32> = KeyedStore::new();
        for (i, k) in ["c", "a", "b"].iter().enumerate() {
            store.get_or_create(key(k), || i as u32);
        }
        let order: Vec<u32> = store.iter().map(|(_, &v)| v).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_params_round_trip_keeps_handles() {
        let mut store: KeyedStore<f64> = KeyedStore::new();
        store.get_or_create(key("x"), || 1.5);
        store.get_or_create(key("y"), || 2.5);
        let h = store.handle(&key("y")).unwrap();

        let restored = KeyedStore::from_params(store.extract_params()).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.handle(&key("y")), Some(h));
        assert_eq!(restored.get(&key("x")), Some(&1.5));
    }

    #[test]
    fn test_from_params_rejects_duplicate_keys() {
        let params = KeyedStoreParams {
            entries: vec![(key("x"), 1.0), (key("x"), 2.0)],
        };
        assert!(matches!(
            KeyedStore::from_params(params),
            Err(FeatureError::Serialization(_))
        ));
    }
}
