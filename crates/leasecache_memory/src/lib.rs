// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A segmented, byte-capacity-bounded in-memory store with SIEVE eviction.
//!
//! [`MemoryStore`] is the default storage engine behind the lease-coordinated cache. It
//! implements [`leasecache_store::ByteStore`] and bounds memory by bytes rather than by entry
//! count:
//!
//! 1. **Segmented:** The configured capacity is divided evenly across a power-of-two number of
//!    segments. A key is routed to a segment by its `xxh3` hash, and each segment has its own
//!    lock, so writers to different segments never contend.
//! 2. **Byte budget:** Every entry costs its key length plus value length plus a fixed
//!    bookkeeping overhead. A write that would push a segment over its budget first evicts
//!    entries until the new one fits. An entry larger than a whole segment is rejected.
//! 3. **SIEVE eviction:** Reads only set an atomic visited bit, so lookups run under a shared
//!    read lock. Eviction sweeps a hand over the insertion list, giving visited entries a
//!    second chance.
//!
//! Each segment is cache-line aligned (64 bytes) to prevent false sharing between locks.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use leasecache_memory::MemoryStore;
//! use leasecache_store::ByteStore;
//!
//! let store = MemoryStore::builder(64 * 1024).segments(4).build()?;
//!
//! store.set(b"user:1", Bytes::from_static(b"alice"))?;
//! assert_eq!(store.get(b"user:1"), Some(Bytes::from_static(b"alice")));
//!
//! assert!(store.delete(b"user:1"));
//! assert_eq!(store.get(b"user:1"), None);
//! # Ok::<(), leasecache_store::Error>(())
//! ```
//!
//! # References
//!
//! 1. **SIEVE:** *SIEVE is Simpler than LRU: an Efficient Turn-Key Eviction Algorithm for Web
//!    Caches* (NSDI '24).
//! 2. **False Sharing:** Intel Developer Guide on Cache Line definitions (64 bytes).

mod builder;
mod segment;
mod sieve;
mod store;

pub use builder::MemoryStoreBuilder;
pub use store::MemoryStore;

/// Fixed bookkeeping cost charged to every entry on top of its key and value bytes.
pub const ENTRY_OVERHEAD: usize = 48;
