// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Byte store abstraction for the lease-coordinated cache front-end.
//!
//! This crate defines the [`ByteStore`] trait that the lease layer composes with, plus the
//! [`Error`] type returned by fallible store writes.
//!
//! # Overview
//!
//! The lease layer only decides *who* may fill a cache miss. Holding the bytes is the job of a
//! store: anything that can look up, write and delete values by byte key. Implement
//! [`ByteStore`] for your storage engine, then hand it to `leasecache`.
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//!
//! use bytes::Bytes;
//! use leasecache_store::{ByteStore, Error};
//! use parking_lot::Mutex;
//!
//! struct SimpleStore(Mutex<HashMap<Vec<u8>, Bytes>>);
//!
//! impl ByteStore for SimpleStore {
//!     fn get(&self, key: &[u8]) -> Option<Bytes> {
//!         self.0.lock().get(key).cloned()
//!     }
//!
//!     fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
//!         self.0.lock().insert(key.to_vec(), value);
//!         Ok(())
//!     }
//!
//!     fn delete(&self, key: &[u8]) -> bool {
//!         self.0.lock().remove(key).is_some()
//!     }
//! }
//! ```

pub mod error;
mod store;
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod testing;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use store::ByteStore;
