// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The lease cache router.
//!
//! This module provides the main [`LeaseCache`] type and the [`ReadOutcome`] it returns.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use leasecache_store::ByteStore;
use tick::Clock;

use crate::builder::{LeaseCacheBuilder, NoStore};
use crate::hash::KeyHash;
use crate::lease::{LeaseId, LeaseTable};
use crate::LeaseConfig;

/// Result of [`LeaseCache::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The store holds a value for the key.
    Found(Bytes),
    /// The key missed and the caller now holds the lease to fill it with
    /// [`LeaseCache::write`].
    LeaseGranted(LeaseId),
    /// The key missed and another caller already holds the lease. Back off and read again
    /// later.
    LeaseRejected,
}

impl ReadOutcome {
    /// Returns the value if the read was a hit.
    #[must_use]
    pub fn value(&self) -> Option<&Bytes> {
        match self {
            Self::Found(value) => Some(value),
            Self::LeaseGranted(_) | Self::LeaseRejected => None,
        }
    }

    /// Consumes the outcome, returning the value if the read was a hit.
    #[must_use]
    pub fn into_value(self) -> Option<Bytes> {
        match self {
            Self::Found(value) => Some(value),
            Self::LeaseGranted(_) | Self::LeaseRejected => None,
        }
    }

    /// Returns the granted lease, if any.
    #[must_use]
    pub const fn lease(&self) -> Option<LeaseId> {
        match self {
            Self::LeaseGranted(lease) => Some(*lease),
            Self::Found(_) | Self::LeaseRejected => None,
        }
    }

    /// Returns `true` if another caller is already filling the key.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::LeaseRejected)
    }
}

/// A sharded cache front-end that lets exactly one caller fill each miss.
///
/// Every key is hashed once with `xxh3`. The low bits of the hash pick one of the
/// power-of-two shards; the high 32 bits are the key's fingerprint inside that shard's lease
/// table. Each operation holds the shard's lock for its whole duration, including the store
/// call, so checking the store and granting a lease happen atomically with respect to every
/// other operation on that shard.
///
/// # Examples
///
/// `Clock::new_frozen` needs tick's `test-util` feature; production code passes a system clock
/// such as the one from `tick::runtime::InactiveClock::activate`.
///
/// ```
/// use leasecache::{LeaseCache, ReadOutcome};
/// use tick::Clock;
///
/// let cache = LeaseCache::builder(Clock::new_frozen()).memory(1 << 20).build()?;
///
/// // The first reader of a missing key gets the lease.
/// let ReadOutcome::LeaseGranted(lease) = cache.read(b"user:1") else {
///     panic!("first read of a missing key is granted a lease");
/// };
///
/// // Everyone else is told to back off until it is filled.
/// assert_eq!(cache.read(b"user:1"), ReadOutcome::LeaseRejected);
///
/// assert!(cache.write(b"user:1", lease, "alice"));
/// assert_eq!(cache.read(b"user:1"), ReadOutcome::Found("alice".into()));
/// # Ok::<(), leasecache::ConfigError>(())
/// ```
pub struct LeaseCache<S> {
    shards: Box<[LeaseTable]>,
    config: LeaseConfig,
    store: S,
    clock: Clock,
}

impl<S> std::fmt::Debug for LeaseCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseCache")
            .field("config", &self.config)
            .field("outstanding_leases", &self.outstanding_leases())
            .finish_non_exhaustive()
    }
}

impl LeaseCache<()> {
    /// Creates a builder for a lease cache that reads time from `clock`.
    ///
    /// Lease ages are measured in whole seconds of `clock.system_time()`, so tests can drive
    /// expiry with a `tick::ClockControl` clock.
    #[must_use]
    pub fn builder(clock: Clock) -> LeaseCacheBuilder<NoStore> {
        LeaseCacheBuilder::new(clock)
    }
}

impl<S> LeaseCache<S> {
    pub(crate) fn from_parts(config: LeaseConfig, store: S, clock: Clock) -> Self {
        let shards = (0..config.shard_count())
            .map(|_| LeaseTable::new(config.slots_per_shard(), config.lease_expiry_secs()))
            .collect();

        tracing::debug!(
            shard_count = config.shard_count(),
            slots_per_shard = config.slots_per_shard(),
            lease_expiry_secs = config.lease_expiry_secs(),
            "lease cache created"
        );

        Self {
            shards,
            config,
            store,
            clock,
        }
    }

    /// Returns the configuration the cache was built with.
    #[must_use]
    pub const fn config(&self) -> &LeaseConfig {
        &self.config
    }

    /// Returns the number of shards.
    #[must_use]
    pub const fn shard_count(&self) -> u32 {
        self.config.shard_count()
    }

    /// Returns the number of lease slots per shard.
    #[must_use]
    pub const fn slots_per_shard(&self) -> u32 {
        self.config.slots_per_shard()
    }

    /// Returns the lease lifetime.
    #[must_use]
    pub fn lease_expiry(&self) -> Duration {
        self.config.lease_expiry()
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the number of leases currently held across all shards.
    ///
    /// Locks every shard in turn, so the total is not an atomic snapshot. Leases past their
    /// expiry are counted until a grant on their shard reclaims them.
    #[must_use]
    pub fn outstanding_leases(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().outstanding()).sum()
    }

    pub(crate) fn locate(&self, key: &[u8]) -> KeyHash {
        KeyHash::of(key, self.config.shard_mask())
    }

    /// Current time in whole seconds since the UNIX epoch.
    #[expect(clippy::cast_possible_truncation, reason = "lease timestamps are 32-bit seconds")]
    fn now(&self) -> u32 {
        self.clock
            .system_time()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs() as u32)
    }
}

impl<S: ByteStore> LeaseCache<S> {
    /// Reads `key`.
    ///
    /// Returns the stored value on a hit. On a miss, tries to grant the caller the lease for
    /// the key: [`ReadOutcome::LeaseGranted`] means the caller should produce the value and
    /// [`write`](Self::write) it; [`ReadOutcome::LeaseRejected`] means someone else is already
    /// doing so.
    pub fn read(&self, key: &[u8]) -> ReadOutcome {
        let KeyHash { fingerprint, shard } = self.locate(key);
        let mut leases = self.shards[shard].lock();

        if let Some(value) = self.store.get(key) {
            return ReadOutcome::Found(value);
        }

        match leases.grant(fingerprint, self.now()) {
            Some(lease) => ReadOutcome::LeaseGranted(lease),
            None => {
                tracing::trace!(shard, fingerprint, "lease rejected, fill already in flight");
                ReadOutcome::LeaseRejected
            }
        }
    }

    /// Fills `key` with `value` using a lease obtained from [`read`](Self::read).
    ///
    /// The lease is released first; the value is written only if the lease was still held.
    /// Returns `true` only if both the release and the store write succeeded. A `false` result
    /// means the lease is gone (released, expired, evicted or invalidated) or the store refused
    /// the value; either way the caller no longer holds the lease.
    pub fn write(&self, key: &[u8], lease: LeaseId, value: impl Into<Bytes>) -> bool {
        let KeyHash { fingerprint, shard } = self.locate(key);
        let mut leases = self.shards[shard].lock();

        if !leases.release(fingerprint, lease) {
            tracing::trace!(shard, fingerprint, lease_id = lease.get(), "stale lease, write skipped");
            return false;
        }

        match self.store.set(key, value.into()) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(shard, lease_id = lease.get(), %error, "store rejected a leased write");
                false
            }
        }
    }

    /// Removes `key` and cancels any lease outstanding for it.
    ///
    /// The next [`read`](Self::read) of the key is eligible for a fresh lease even if a fill
    /// was in flight. Returns `true` if the store held a value for the key.
    pub fn invalidate(&self, key: &[u8]) -> bool {
        let KeyHash { fingerprint, shard } = self.locate(key);
        let mut leases = self.shards[shard].lock();

        let cancelled = leases.force_clear(fingerprint);
        if cancelled > 0 {
            tracing::debug!(shard, fingerprint, cancelled, "invalidation cancelled outstanding leases");
        }

        self.store.delete(key)
    }
}
