// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides [`MockStore`], an in-memory store that records every operation and
//! supports failure injection for exercising error paths.

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{ByteStore, Error};

/// Recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// A lookup of the given key.
    Get(Vec<u8>),
    /// A write of the given key and value.
    Set {
        /// The key that was written.
        key: Vec<u8>,
        /// The value that was written.
        value: Bytes,
    },
    /// A delete of the given key.
    Delete(Vec<u8>),
}

type FailPredicate = Box<dyn Fn(&StoreOp) -> bool + Send + Sync>;

/// A recording in-memory store for tests.
///
/// Clones share the same data, operation log and failure predicate.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use leasecache_store::ByteStore;
/// use leasecache_store::testing::{MockStore, StoreOp};
///
/// let store = MockStore::new();
/// store.fail_when(|op| matches!(op, StoreOp::Set { .. }));
///
/// assert!(store.set(b"key", Bytes::from_static(b"value")).is_err());
/// assert_eq!(store.get(b"key"), None);
/// ```
pub struct MockStore {
    data: Arc<Mutex<HashMap<Vec<u8>, Bytes>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl std::fmt::Debug for MockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl Clone for MockStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new empty mock store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Sets a predicate deciding which operations fail.
    ///
    /// Only `set` can report a failure; a failing `get` behaves like a miss and a failing
    /// `delete` removes nothing.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Records `op` and reports whether it should fail.
    fn record(&self, op: StoreOp) -> bool {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        fail
    }
}

impl ByteStore for MockStore {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        if self.record(StoreOp::Get(key.to_vec())) {
            return None;
        }
        self.data.lock().get(key).cloned()
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
        let op = StoreOp::Set {
            key: key.to_vec(),
            value: value.clone(),
        };
        if self.record(op) {
            return Err(Error::caused_by("mock: set failed"));
        }
        self.data.lock().insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> bool {
        if self.record(StoreOp::Delete(key.to_vec())) {
            return false;
        }
        self.data.lock().remove(key).is_some()
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}
