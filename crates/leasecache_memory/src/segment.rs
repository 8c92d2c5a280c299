// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Store segment implementation.
//!
//! Each segment owns a Swiss table (`hashbrown::HashMap`) of entries, the SIEVE metadata used
//! to evict them, and a byte budget. Segments are cache-line aligned to prevent false sharing.

use std::sync::Arc;

use bytes::Bytes;
use hashbrown::HashMap;
use leasecache_store::Error;
use parking_lot::RwLock;

use crate::ENTRY_OVERHEAD;
use crate::sieve::{NodeIndex, SieveList};

/// A single store segment.
///
/// Aligned to the CPU cache line (64 bytes) so neighbouring segment locks never share a line.
#[repr(align(64))]
pub struct Segment {
    inner: RwLock<SegmentInner>,
}

impl Segment {
    /// Creates an empty segment that may hold up to `budget` bytes.
    #[must_use]
    pub fn new(budget: usize) -> Self {
        Self {
            inner: RwLock::new(SegmentInner::new(budget)),
        }
    }

    /// Looks up a key, marking the entry as visited for SIEVE.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.inner.read().get(key)
    }

    /// Stores a value, evicting other entries until it fits.
    pub fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
        self.inner.write().set(key, value)
    }

    /// Removes a key. Returns `true` if it was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.inner.write().delete(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.inner.read().used
    }

    #[cfg(test)]
    fn budget(&self) -> usize {
        self.inner.read().budget
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Segment")
            .field("len", &inner.map.len())
            .field("used_bytes", &inner.used)
            .field("budget", &inner.budget)
            .finish()
    }
}

struct SegmentInner {
    map: HashMap<Arc<[u8]>, Entry>,
    sieve: SieveList<Arc<[u8]>>,
    /// Bytes currently charged to this segment.
    used: usize,
    budget: usize,
}

impl SegmentInner {
    fn new(budget: usize) -> Self {
        Self {
            map: HashMap::new(),
            sieve: SieveList::new(),
            used: 0,
            budget,
        }
    }

    fn get(&self, key: &[u8]) -> Option<Bytes> {
        let entry = self.map.get(key)?;
        self.sieve.mark_visited(entry.sieve_index);
        Some(entry.value.clone())
    }

    fn set(&mut self, key: &[u8], value: Bytes) -> Result<(), Error> {
        let cost = entry_cost(key, &value);
        if cost > self.budget {
            return Err(Error::from_message(format!(
                "entry of {cost} bytes exceeds the segment budget of {} bytes",
                self.budget
            )));
        }

        // An overwrite re-enters as a fresh node but keeps its second chance.
        let replaced = self.delete(key);

        while self.used + cost > self.budget {
            if !self.evict_one() {
                break;
            }
        }

        let key: Arc<[u8]> = Arc::from(key);
        let sieve_index = self.sieve.insert(Arc::clone(&key));
        if replaced {
            self.sieve.mark_visited(sieve_index);
        }

        self.used += cost;
        self.map.insert(key, Entry { value, sieve_index });
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> bool {
        let Some((key, entry)) = self.map.remove_entry(key) else {
            return false;
        };
        self.sieve.remove(entry.sieve_index);
        self.used -= entry_cost(&key, &entry.value);
        true
    }

    /// Evicts one entry. Returns `false` if there was nothing to evict.
    fn evict_one(&mut self) -> bool {
        let Some(evicted) = self.sieve.evict() else {
            return false;
        };
        if let Some(entry) = self.map.remove(&evicted) {
            self.used -= entry_cost(&evicted, &entry.value);
        }
        true
    }

    fn clear(&mut self) {
        self.map.clear();
        self.sieve = SieveList::new();
        self.used = 0;
    }
}

struct Entry {
    value: Bytes,
    sieve_index: NodeIndex,
}

fn entry_cost(key: &[u8], value: &Bytes) -> usize {
    key.len() + value.len() + ENTRY_OVERHEAD
}
