// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A lease-coordinated cache front-end that prevents thundering herds on misses.
//!
//! [`LeaseCache`] sits in front of a [`ByteStore`]. When a key misses, the first reader is
//! granted a short-lived [`LeaseId`] and becomes responsible for producing the value; every
//! other reader of that key is told to back off until the value is written, the lease expires,
//! or the key is invalidated. Writes only land while the writer's lease is still valid, so a
//! slow filler can never overwrite a newer invalidation with stale data.
//!
//! Leases live in a fixed number of small, cache-line-sized lease tables. Each table holds a
//! handful of slots and reclaims expired leases on the next grant, so there is no background
//! work and memory use never grows.
//!
//! # Examples
//!
//! ```
//! use leasecache::{LeaseCache, ReadOutcome};
//! use tick::runtime::InactiveClock;
//!
//! // A system clock. Async runtimes usually hand one out; tests use `tick::ClockControl`.
//! let (clock, _driver) = InactiveClock::default().activate();
//! let cache = LeaseCache::builder(clock).memory(1 << 20).build()?;
//!
//! let value = match cache.read(b"config") {
//!     ReadOutcome::Found(value) => value,
//!     ReadOutcome::LeaseGranted(lease) => {
//!         let value = bytes::Bytes::from_static(b"loaded from the database");
//!         cache.write(b"config", lease, value.clone());
//!         value
//!     }
//!     ReadOutcome::LeaseRejected => {
//!         // Someone else is loading it. Retry shortly or serve a fallback.
//!         return Ok(());
//!     }
//! };
//!
//! assert_eq!(cache.read(b"config"), ReadOutcome::Found(value));
//! # Ok::<(), leasecache::ConfigError>(())
//! ```
//!
//! # Features
//!
//! - `memory` (default): the bundled [`MemoryStore`](leasecache_memory::MemoryStore) and
//!   [`LeaseCacheBuilder::memory`].

pub mod builder;
mod cache;
mod config;
mod error;
mod hash;
mod lease;

pub use builder::LeaseCacheBuilder;
pub use cache::{LeaseCache, ReadOutcome};
pub use config::{
    DEFAULT_LEASE_EXPIRY, DEFAULT_SHARD_COUNT, DEFAULT_SLOTS_PER_SHARD, LeaseConfig, LeaseConfigBuilder, ceil_power_of_two,
};
pub use error::{ConfigError, Result};
pub use lease::LeaseId;
pub use leasecache_store::{ByteStore, Error as StoreError};

#[cfg(feature = "memory")]
pub use leasecache_memory::MemoryStore;
