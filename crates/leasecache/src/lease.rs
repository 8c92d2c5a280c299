// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-shard lease tables.
//!
//! A lease table is a fixed array of slots behind one mutex. Slots are found by linear scan:
//! the array is small and stays cache resident, and it never allocates after construction.

use std::fmt;
use std::num::NonZeroU32;

use parking_lot::{Mutex, MutexGuard};

/// Identifier of a granted lease.
///
/// Ids are issued per shard from a counter that increases by one on every grant. Zero is
/// reserved for empty slots, so a `LeaseId` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeaseId(NonZeroU32);

impl LeaseId {
    /// Creates a lease id from its raw value. Returns `None` for zero.
    #[must_use]
    pub const fn new(id: u32) -> Option<Self> {
        match NonZeroU32::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the raw value of this id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One slot of a lease table. A slot with `lease_id == 0` is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LeaseSlot {
    pub(crate) fingerprint: u32,
    pub(crate) lease_id: u32,
    /// Grant time in whole seconds since the UNIX epoch.
    pub(crate) created_at: u32,
}

impl LeaseSlot {
    const EMPTY: Self = Self {
        fingerprint: 0,
        lease_id: 0,
        created_at: 0,
    };

    const fn is_empty(&self) -> bool {
        self.lease_id == 0
    }
}

/// A lease table for one shard.
///
/// Aligned to the CPU cache line (64 bytes) so the locks of neighbouring shards in the
/// router's shard array never share a line.
#[repr(align(64))]
pub(crate) struct LeaseTable {
    inner: Mutex<LeaseSlots>,
}

impl LeaseTable {
    /// Creates a table of `size` empty slots whose leases expire after `expiry_secs`.
    pub(crate) fn new(size: u32, expiry_secs: u32) -> Self {
        debug_assert!(size > 0, "a lease table needs at least one slot");
        Self {
            inner: Mutex::new(LeaseSlots::new(size, expiry_secs)),
        }
    }

    /// Locks the table. The caller holds the shard for as long as the guard lives.
    pub(crate) fn lock(&self) -> MutexGuard<'_, LeaseSlots> {
        self.inner.lock()
    }
}

impl fmt::Debug for LeaseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.inner.lock();
        f.debug_struct("LeaseTable")
            .field("capacity", &slots.capacity())
            .field("outstanding", &slots.outstanding())
            .finish()
    }
}

/// The lock-protected state of a [`LeaseTable`].
pub(crate) struct LeaseSlots {
    slots: Box<[LeaseSlot]>,
    expiry_secs: u32,
    /// Last issued id; zero before the first grant.
    next_lease_id: u32,
}

impl LeaseSlots {
    fn new(size: u32, expiry_secs: u32) -> Self {
        Self {
            slots: vec![LeaseSlot::EMPTY; size as usize].into_boxed_slice(),
            expiry_secs,
            next_lease_id: 0,
        }
    }

    /// Tries to grant a lease for `fingerprint` at time `now` (seconds).
    ///
    /// Expired slots are reclaimed first. The grant is rejected if a live lease for the same
    /// fingerprint exists. Otherwise the slot with the smallest lease id is overwritten: an
    /// empty slot if there is one, else the oldest-issued live lease, which is evicted.
    pub(crate) fn grant(&mut self, fingerprint: u32, now: u32) -> Option<LeaseId> {
        let expiry = u64::from(self.expiry_secs);
        for slot in &mut *self.slots {
            if u64::from(slot.created_at) + expiry <= u64::from(now) {
                *slot = LeaseSlot::EMPTY;
            }
        }

        let mut min_index = 0;
        let mut min_lease = self.slots[0].lease_id;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.fingerprint == fingerprint && !slot.is_empty() {
                return None;
            }
            if slot.lease_id < min_lease {
                min_lease = slot.lease_id;
                min_index = index;
            }
        }

        // Zero marks an empty slot, so the counter skips it when it wraps.
        let id = NonZeroU32::new(self.next_lease_id.wrapping_add(1)).unwrap_or(NonZeroU32::MIN);
        self.next_lease_id = id.get();

        let victim = &mut self.slots[min_index];
        if !victim.is_empty() {
            tracing::debug!(
                evicted_lease_id = victim.lease_id,
                evicted_fingerprint = victim.fingerprint,
                lease_id = id.get(),
                "lease table full, evicting oldest live lease"
            );
        }
        *victim = LeaseSlot {
            fingerprint,
            lease_id: id.get(),
            created_at: now,
        };

        Some(LeaseId(id))
    }

    /// Releases the lease `lease` held for `fingerprint`.
    ///
    /// Returns `false` if no slot holds exactly that pair, meaning the lease was never granted
    /// or has since been released, expired, force-cleared or evicted.
    pub(crate) fn release(&mut self, fingerprint: u32, lease: LeaseId) -> bool {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| slot.fingerprint == fingerprint && slot.lease_id == lease.get())
        else {
            return false;
        };
        *slot = LeaseSlot::EMPTY;
        true
    }

    /// Clears every slot holding `fingerprint`, whatever its lease id. Returns how many live
    /// leases were cancelled.
    pub(crate) fn force_clear(&mut self, fingerprint: u32) -> usize {
        let mut cleared = 0;
        for slot in &mut *self.slots {
            if slot.fingerprint == fingerprint {
                if !slot.is_empty() {
                    cleared += 1;
                }
                *slot = LeaseSlot::EMPTY;
            }
        }
        cleared
    }

    /// Number of slots holding a lease. Expired leases count until the next grant sweeps them.
    pub(crate) fn outstanding(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.is_empty()).count()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn slot(&self, index: usize) -> LeaseSlot {
        self.slots[index]
    }

    #[cfg(test)]
    pub(crate) fn set_next_lease_id(&mut self, id: u32) {
        self.next_lease_id = id;
    }
}
