// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tests for the `ByteStore` trait's provided methods and pointer impls.

use std::sync::Arc;

use bytes::Bytes;
use leasecache_store::{ByteStore, Error};

/// A store that holds at most one entry and does not report its size.
#[derive(Default)]
struct SingleSlot(parking_lot::Mutex<Option<(Vec<u8>, Bytes)>>);

impl ByteStore for SingleSlot {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.0
            .lock()
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
        if value.len() > 8 {
            return Err(Error::from_message("value exceeds slot size"));
        }
        *self.0.lock() = Some((key.to_vec(), value));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> bool {
        let mut slot = self.0.lock();
        if slot.as_ref().is_some_and(|(k, _)| k == key) {
            *slot = None;
            return true;
        }
        false
    }
}

#[test]
fn len_defaults_to_unknown() {
    let store = SingleSlot::default();
    assert_eq!(store.len(), None);
    assert_eq!(store.is_empty(), None);
}

#[test]
fn arc_forwards_to_inner_store() {
    let store: Arc<dyn ByteStore> = Arc::new(SingleSlot::default());
    store.set(b"k", Bytes::from_static(b"v")).expect("set should succeed");
    assert_eq!(store.get(b"k"), Some(Bytes::from_static(b"v")));
    assert!(store.delete(b"k"));
    assert!(!store.delete(b"k"));
}

#[test]
fn boxed_store_reports_set_errors() {
    let store: Box<dyn ByteStore> = Box::new(SingleSlot::default());
    let err = store
        .set(b"k", Bytes::from_static(b"much too long"))
        .expect_err("oversized value must be rejected");
    assert!(err.to_string().contains("value exceeds slot size"));
    assert_eq!(store.get(b"k"), None);
}
