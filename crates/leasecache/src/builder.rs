// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`LeaseCache`].
//!
//! The builder starts without a store. Pick one with [`LeaseCacheBuilder::store`] or, with the
//! `memory` feature, [`LeaseCacheBuilder::memory`]; only then does `build` become available.

use std::time::Duration;

use leasecache_store::ByteStore;
use tick::Clock;

use crate::builder::sealed::Sealed;
use crate::{LeaseCache, LeaseConfig, LeaseConfigBuilder, Result};

#[cfg(feature = "memory")]
use leasecache_memory::{MemoryStore, MemoryStoreBuilder};

mod sealed {
    pub(crate) trait Sealed {}
}

/// Where a [`LeaseCacheBuilder`] gets its store from.
///
/// This trait is sealed and cannot be implemented outside this crate.
#[expect(private_bounds, reason = "intentionally sealed trait pattern")]
pub trait StoreSource: Sealed {
    /// The store the finished cache fronts.
    type Store: ByteStore;

    #[doc(hidden)]
    fn into_store(self) -> Result<Self::Store>;
}

/// Builder state before a store has been chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

/// Builder state holding a caller-provided store.
#[derive(Debug, Clone)]
pub struct Provided<S>(S);

impl<S> Sealed for Provided<S> {}

impl<S: ByteStore> StoreSource for Provided<S> {
    type Store = S;

    fn into_store(self) -> Result<S> {
        Ok(self.0)
    }
}

/// Builder state for the bundled in-memory store.
#[cfg(feature = "memory")]
#[derive(Debug, Clone)]
pub struct Memory(MemoryStoreBuilder);

#[cfg(feature = "memory")]
impl Sealed for Memory {}

#[cfg(feature = "memory")]
impl StoreSource for Memory {
    type Store = MemoryStore;

    fn into_store(self) -> Result<MemoryStore> {
        self.0
            .build()
            .map_err(|err| crate::ConfigError::caused_by("memory store could not be built", err))
    }
}

/// Builder for constructing a [`LeaseCache`].
///
/// Created by [`LeaseCache::builder`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use leasecache::LeaseCache;
/// use tick::runtime::InactiveClock;
///
/// let (clock, _driver) = InactiveClock::default().activate();
/// let cache = LeaseCache::builder(clock)
///     .memory(64 << 20)
///     .shard_count(256)
///     .slots_per_shard(8)
///     .lease_expiry(Duration::from_secs(10))
///     .build()?;
///
/// assert_eq!(cache.shard_count(), 256);
/// assert_eq!(cache.store().capacity(), 64 << 20);
/// # Ok::<(), leasecache::ConfigError>(())
/// ```
#[derive(Debug)]
pub struct LeaseCacheBuilder<S = NoStore> {
    source: S,
    config: LeaseConfigBuilder,
    clock: Clock,
}

impl LeaseCacheBuilder<NoStore> {
    pub(crate) fn new(clock: Clock) -> Self {
        Self {
            source: NoStore,
            config: LeaseConfig::builder(),
            clock,
        }
    }

    /// Fronts a caller-provided store.
    pub fn store<S: ByteStore>(self, store: S) -> LeaseCacheBuilder<Provided<S>> {
        self.with_source(Provided(store))
    }

    /// Fronts a new [`MemoryStore`] holding at most `capacity` bytes.
    #[cfg(feature = "memory")]
    #[must_use]
    pub fn memory(self, capacity: usize) -> LeaseCacheBuilder<Memory> {
        self.with_source(Memory(MemoryStore::builder(capacity)))
    }

    fn with_source<S>(self, source: S) -> LeaseCacheBuilder<S> {
        LeaseCacheBuilder {
            source,
            config: self.config,
            clock: self.clock,
        }
    }
}

#[cfg(feature = "memory")]
impl LeaseCacheBuilder<Memory> {
    /// Sets the number of segments of the in-memory store.
    #[must_use]
    pub fn memory_segments(self, segments: usize) -> Self {
        Self {
            source: Memory(self.source.0.segments(segments)),
            ..self
        }
    }
}

impl<S> LeaseCacheBuilder<S> {
    /// Sets the number of lease shards. Rounded up to a power of two.
    #[must_use]
    pub fn shard_count(mut self, shard_count: u32) -> Self {
        self.config = self.config.shard_count(shard_count);
        self
    }

    /// Sets the number of lease slots in each shard. Rounded up to a power of two.
    #[must_use]
    pub fn slots_per_shard(mut self, slots_per_shard: u32) -> Self {
        self.config = self.config.slots_per_shard(slots_per_shard);
        self
    }

    /// Sets how long a lease is held before it can be reclaimed.
    #[must_use]
    pub fn lease_expiry(mut self, lease_expiry: Duration) -> Self {
        self.config = self.config.lease_expiry(lease_expiry);
        self
    }

    /// Replaces every lease setting with those of an already validated configuration.
    #[must_use]
    pub fn config(mut self, config: LeaseConfig) -> Self {
        self.config = LeaseConfig::builder()
            .shard_count(config.shard_count())
            .slots_per_shard(config.slots_per_shard())
            .lease_expiry(config.lease_expiry());
        self
    }
}

impl<S: StoreSource> LeaseCacheBuilder<S> {
    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::ConfigError) if a lease setting is invalid or the store could not be created.
    pub fn build(self) -> Result<LeaseCache<S::Store>> {
        let config = self.config.build()?;
        let store = self.source.into_store()?;
        Ok(LeaseCache::from_parts(config, store, self.clock))
    }
}
