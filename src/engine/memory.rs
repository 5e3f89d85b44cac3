use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::KvEngine;
use tracing::trace;

/// The primary struct for working with a [`KvStore`].
///
/// All entries are kept in one `HashMap` guarded by one `Mutex`. Every operation holds the
/// lock for its whole duration, so operations are totally ordered: no caller can observe a
/// half applied SET or DEL made by another caller.
///
/// Cloning a `KvStore` clones the handle, not the data.
#[derive(Debug, Clone, Default)]
pub struct KvStore {
    map: Arc<Mutex<HashMap<String, String>>>,
}

impl KvStore {
    /// creates a new, empty [`KvStore`]
    pub fn new() -> KvStore {
        KvStore::default()
    }

    /// returns the number of entries currently in the store
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// returns `true` if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while the guard is held can only come from outside a HashMap call, which leaves
    // the map itself consistent, so a poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvEngine for KvStore {
    /// inserts the specified `key` and `value` into this `KvStore`, overriding any existing
    /// key/value entry
    fn set(&self, key: String, value: String) {
        trace!(%key, "set");
        self.lock().insert(key, value);
    }

    /// attempts to retrieve the value associated with `key`.
    /// returns `Some(value)` if the `key` was found, else returns `None`
    fn get(&self, key: &str) -> Option<String> {
        trace!(%key, "get");
        self.lock().get(key).cloned()
    }

    /// removes the specified `key` and its associated value from this KvStore
    ///
    /// returns `false` if the given `key` was not in the KvStore
    fn remove(&self, key: &str) -> bool {
        trace!(%key, "remove");
        self.lock().remove(key).is_some()
    }
}
