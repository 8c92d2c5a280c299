// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for lease-coordinated reads, writes and invalidations.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use leasecache::{ByteStore, LeaseCache, LeaseId, MemoryStore, ReadOutcome};
use leasecache_store::testing::{MockStore, StoreOp};
use tick::ClockControl;
use tick::runtime::InactiveClock;

fn start() -> ClockControl {
    ClockControl::new_at(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
}

fn memory_cache(control: &ClockControl) -> LeaseCache<MemoryStore> {
    LeaseCache::builder(control.to_clock())
        .memory(1 << 20)
        .memory_segments(4)
        .build()
        .expect("valid configuration")
}

/// One shard with four slots, so every key competes for the same lease table.
fn single_shard_cache(control: &ClockControl) -> LeaseCache<MemoryStore> {
    LeaseCache::builder(control.to_clock())
        .memory(1 << 20)
        .shard_count(1)
        .slots_per_shard(4)
        .build()
        .expect("valid configuration")
}

/// Propagates configuration errors with `?` through the crate's result alias.
fn sized_cache(control: &ClockControl, shards: u32, slots: u32) -> leasecache::Result<LeaseCache<MemoryStore>> {
    let cache = LeaseCache::builder(control.to_clock())
        .memory(1 << 20)
        .shard_count(shards)
        .slots_per_shard(slots)
        .build()?;
    Ok(cache)
}

fn granted(outcome: ReadOutcome) -> LeaseId {
    outcome.lease().expect("read should be granted a lease")
}

#[test]
fn first_read_is_granted_second_is_rejected() {
    let cache = memory_cache(&start());

    let lease = granted(cache.read(b"key"));
    assert!(lease.get() > 0);
    assert_eq!(cache.read(b"key"), ReadOutcome::LeaseRejected);
    assert_eq!(cache.outstanding_leases(), 1);
}

#[test]
fn leased_write_is_visible() {
    let cache = memory_cache(&start());

    let lease = granted(cache.read(b"key"));
    assert!(cache.write(b"key", lease, "value"));
    assert_eq!(cache.read(b"key"), ReadOutcome::Found(Bytes::from_static(b"value")));
    assert_eq!(cache.outstanding_leases(), 0);
}

#[test]
fn value_stays_until_invalidated() {
    let cache = memory_cache(&start());

    let lease = granted(cache.read(b"key"));
    assert!(cache.write(b"key", lease, "value"));

    for _ in 0..5 {
        assert_eq!(cache.read(b"key").into_value(), Some(Bytes::from_static(b"value")));
    }

    assert!(cache.invalidate(b"key"));
    assert!(!cache.invalidate(b"key"));
    assert!(cache.read(b"key").lease().is_some());
}

#[test]
fn stale_write_leaves_store_untouched() {
    let store = MockStore::new();
    let cache = LeaseCache::builder(start().to_clock())
        .store(store.clone())
        .build()
        .expect("valid configuration");

    let lease = granted(cache.read(b"key"));
    let stale = LeaseId::new(lease.get() + 1).expect("nonzero");

    assert!(!cache.write(b"key", stale, "value"));
    assert_eq!(store.entry_count(), 0);
    assert!(!store.operations().iter().any(|op| matches!(op, StoreOp::Set { .. })));

    // The real lease is still outstanding and still works.
    assert!(cache.read(b"key").is_rejected());
    assert!(cache.write(b"key", lease, "value"));
    assert!(store.contains_key(b"key"));
}

#[test]
fn double_write_keeps_first_value() {
    let cache = memory_cache(&start());

    let lease = granted(cache.read(b"key"));
    assert!(cache.write(b"key", lease, "first"));
    assert!(!cache.write(b"key", lease, "second"));
    assert_eq!(cache.read(b"key").into_value(), Some(Bytes::from_static(b"first")));
}

#[test]
fn invalidate_cancels_an_in_flight_fill() {
    let cache = memory_cache(&start());

    let lease = granted(cache.read(b"key"));
    assert!(!cache.invalidate(b"key"));

    // The old filler loses, the next reader gets a fresh lease.
    assert!(!cache.write(b"key", lease, "stale"));
    let fresh = granted(cache.read(b"key"));
    assert!(fresh > lease);
    assert!(cache.write(b"key", fresh, "fresh"));
    assert_eq!(cache.read(b"key").into_value(), Some(Bytes::from_static(b"fresh")));
}

#[test]
fn read_after_invalidate_is_never_rejected() {
    let cache = memory_cache(&start());

    for round in 0..10 {
        let key = format!("key-{round}");
        let _ = cache.read(key.as_bytes());
        assert!(cache.read(key.as_bytes()).is_rejected());

        let _ = cache.invalidate(key.as_bytes());
        assert!(!cache.read(key.as_bytes()).is_rejected());
    }
}

#[test]
fn full_table_evicts_oldest_lease() {
    let cache = single_shard_cache(&start());

    let ids: Vec<u32> = [b"A", b"B", b"C", b"D"].iter().map(|key| granted(cache.read(*key)).get()).collect();
    assert_eq!(ids, [1, 2, 3, 4]);

    assert_eq!(granted(cache.read(b"E")).get(), 5);

    let evicted = LeaseId::new(1).expect("nonzero");
    assert!(!cache.write(b"A", evicted, "x"));
    assert_eq!(granted(cache.read(b"A")).get(), 6);

    // B held the smallest live id and was evicted to make room for A.
    assert!(!cache.write(b"B", LeaseId::new(2).expect("nonzero"), "x"));
    assert_eq!(cache.outstanding_leases(), 4);
}

#[test]
fn lease_expires_after_configured_time() {
    let control = start();
    let cache = LeaseCache::builder(control.to_clock())
        .memory(1 << 20)
        .lease_expiry(Duration::from_secs(4_000))
        .build()
        .expect("valid configuration");

    assert_eq!(granted(cache.read(b"K")).get(), 1);

    control.advance(Duration::from_secs(3_999));
    assert!(cache.read(b"K").is_rejected());

    control.advance(Duration::from_secs(1));
    assert_eq!(granted(cache.read(b"K")).get(), 2);
}

#[test]
fn expired_lease_cannot_write() {
    let control = start();
    let cache = memory_cache(&control);

    let first = granted(cache.read(b"key"));
    control.advance(Duration::from_secs(30));
    let second = granted(cache.read(b"key"));

    assert!(!cache.write(b"key", first, "late"));
    assert!(cache.write(b"key", second, "on time"));
    assert_eq!(cache.read(b"key").into_value(), Some(Bytes::from_static(b"on time")));
}

#[test]
fn ids_increase_within_a_shard() {
    let cache = LeaseCache::builder(start().to_clock())
        .memory(1 << 20)
        .shard_count(1)
        .build()
        .expect("valid configuration");

    let mut last = 0;
    for i in 0..16 {
        let id = granted(cache.read(format!("key-{i}").as_bytes())).get();
        assert!(id > last, "{id} should be greater than {last}");
        last = id;
    }
}

#[test]
fn builder_rounds_counts() {
    let cache = LeaseCache::builder(start().to_clock())
        .memory(1 << 20)
        .shard_count(120)
        .slots_per_shard(5)
        .build()
        .expect("valid configuration");

    assert_eq!(cache.shard_count(), 128);
    assert_eq!(cache.slots_per_shard(), 8);
    assert_eq!(cache.lease_expiry(), Duration::from_secs(30));
}

#[test]
fn empty_key_is_a_valid_key() {
    let cache = memory_cache(&start());

    let lease = granted(cache.read(b""));
    assert!(cache.write(b"", lease, "empty"));
    assert_eq!(cache.read(b"").into_value(), Some(Bytes::from_static(b"empty")));
}

#[test]
fn oversized_value_releases_lease_without_storing() {
    let cache = LeaseCache::builder(start().to_clock())
        .memory(1_024)
        .memory_segments(1)
        .build()
        .expect("valid configuration");

    let lease = granted(cache.read(b"big"));
    assert!(!cache.write(b"big", lease, vec![0_u8; 4_096]));
    assert_eq!(cache.outstanding_leases(), 0);
    assert_eq!(cache.store().len(), Some(0));
    assert!(cache.read(b"big").lease().is_some());
}

#[test]
fn values_written_outside_the_cache_are_found() {
    let store = MockStore::new();
    store.set(b"warm", Bytes::from_static(b"preloaded")).expect("set should succeed");

    let cache = LeaseCache::builder(start().to_clock())
        .store(store)
        .build()
        .expect("valid configuration");

    assert_eq!(cache.read(b"warm").into_value(), Some(Bytes::from_static(b"preloaded")));
    assert_eq!(cache.outstanding_leases(), 0);
}

#[test]
fn runs_on_a_system_clock() {
    let (clock, _driver) = InactiveClock::default().activate();
    let cache = LeaseCache::builder(clock)
        .memory(1 << 20)
        .build()
        .expect("valid configuration");

    let lease = granted(cache.read(b"key"));
    assert_eq!(cache.read(b"key"), ReadOutcome::LeaseRejected);
    assert!(cache.write(b"key", lease, "value"));
    assert_eq!(cache.read(b"key"), ReadOutcome::Found(Bytes::from_static(b"value")));
}

#[test]
fn build_errors_propagate_through_result_alias() {
    let control = start();

    let cache = sized_cache(&control, 3, 3).expect("valid configuration");
    assert_eq!(cache.shard_count(), 4);
    assert_eq!(cache.slots_per_shard(), 4);

    let err = sized_cache(&control, 0, 4).expect_err("zero shards");
    assert_eq!(err.reason(), "shard count must be greater than zero");

    let err = sized_cache(&control, 4, 0).expect_err("zero slots");
    assert_eq!(err.reason(), "slots per shard must be greater than zero");
}
