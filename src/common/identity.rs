//! Series identity interning
//!
//! Maps byte strings (series keys) to dense `u64` ids. One map is built per
//! process and shared by `Arc`; a single `RwLock` guards lookup and insert.
//! Ids are never reused: removing an entry leaves an empty slot behind.

use std::collections::HashMap;
use std::sync::RwLock;

const INITIAL_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Inner {
    lookup: HashMap<Vec<u8>, u64>,
    items: Vec<Option<Vec<u8>>>,
}

/// Concurrent interning map from series keys to ids.
#[derive(Debug)]
pub struct IdentityMap {
    inner: RwLock<Inner>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                lookup: HashMap::with_capacity(INITIAL_CAPACITY),
                items: Vec::with_capacity(INITIAL_CAPACITY),
            }),
        }
    }

    /// Intern `key`, returning its id and whether it was newly inserted.
    pub fn set(&self, key: &[u8]) -> (u64, bool) {
        if let Some(id) = self.lookup(key) {
            return (id, false);
        }

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have won between the read and write lock
        if let Some(&id) = inner.lookup.get(key) {
            return (id, false);
        }

        let id = inner.items.len() as u64;
        inner.items.push(Some(key.to_vec()));
        inner.lookup.insert(key.to_vec(), id);
        (id, true)
    }

    /// Id of `key`, if interned.
    pub fn lookup(&self, key: &[u8]) -> Option<u64> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.lookup.get(key).copied()
    }

    /// Key for `id`; `None` for unknown or removed ids.
    pub fn get(&self, id: u64) -> Option<Vec<u8>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        usize::try_from(id)
            .ok()
            .and_then(|idx| inner.items.get(idx))
            .and_then(|item| item.clone())
    }

    /// Remove `key`, returning the id it held.
    pub fn remove(&self, key: &[u8]) -> Option<u64> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let id = inner.lookup.remove(key)?;
        if let Some(slot) = inner.items.get_mut(id as usize) {
            *slot = None;
        }
        Some(id)
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .lookup
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdentityMap {
    fn default() -> Self {
        Self::new()
    }
}
