//! This module provides the key/value storage engine used by the server.
//! The only engine implemented is the in-memory [`KvStore`]; the [`KvEngine`] trait is the
//! seam the server and the protocol dispatch are written against.

/// A trait for the basic functionality of a key/value storage engine.
///
/// Handles are cheap to clone and every clone refers to the same underlying data, so one
/// handle can be moved into each job the server submits to its thread pool.
pub trait KvEngine: Clone + Send + 'static {
    /// sets a `key` and `value`
    ///
    /// If the given `key` already exists the previous `value` will be overwritten.
    fn set(&self, key: String, value: String);

    /// Gets the value associated with the given `key`
    ///
    /// Returns `None` if the given `key` does not exist.
    fn get(&self, key: &str) -> Option<String>;

    /// Removes the given `key` (and associated value) from the store
    ///
    /// Returns `true` if an entry was removed, `false` if the `key` was absent.
    fn remove(&self, key: &str) -> bool;
}

mod memory;

pub use self::memory::KvStore;
