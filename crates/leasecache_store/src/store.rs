// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The trait every byte store implements.

use std::sync::Arc;

use bytes::Bytes;

use crate::Error;

/// A byte-oriented, capacity-bounded key/value store.
///
/// The lease layer calls into the store while holding the lock of the shard that owns the
/// key, so every method is synchronous. A store may run its own eviction policy; that policy
/// is independent of lease eviction.
///
/// Only `get`, `set` and `delete` are required. `len` defaults to `None` for stores that do not
/// track their size.
pub trait ByteStore: Send + Sync {
    /// Returns the value stored under `key`, or `None` if the key is not present.
    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot hold the value, for example because the entry is
    /// larger than the store's capacity.
    fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error>;

    /// Removes `key` from the store. Returns `true` if a value was removed.
    fn delete(&self, key: &[u8]) -> bool;

    /// Returns the number of stored entries, if supported.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Returns `true` if the store holds no entries.
    ///
    /// Returns `None` for implementations that don't track size.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}

impl<T: ByteStore + ?Sized> ByteStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> bool {
        (**self).delete(key)
    }

    fn len(&self) -> Option<u64> {
        (**self).len()
    }
}

impl<T: ByteStore + ?Sized> ByteStore for Box<T> {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> bool {
        (**self).delete(key)
    }

    fn len(&self) -> Option<u64> {
        (**self).len()
    }
}
