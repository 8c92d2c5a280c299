// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The segmented in-memory store.

use bytes::Bytes;
use leasecache_store::{ByteStore, Error};
use xxhash_rust::xxh3::xxh3_64;

use crate::builder::MemoryStoreBuilder;
use crate::segment::Segment;

/// A byte-capacity-bounded in-memory [`ByteStore`].
///
/// Keys are routed to one of a power-of-two number of segments by their `xxh3` hash. Each
/// segment holds `capacity / segments` bytes and evicts with SIEVE once full.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use leasecache_memory::MemoryStore;
/// use leasecache_store::ByteStore;
///
/// let store = MemoryStore::builder(1 << 20).build()?;
/// store.set(b"hello", Bytes::from_static(b"world"))?;
/// assert_eq!(store.get(b"hello"), Some(Bytes::from_static(b"world")));
/// assert_eq!(store.len(), Some(1));
/// # Ok::<(), leasecache_store::Error>(())
/// ```
pub struct MemoryStore {
    segments: Box<[Segment]>,
    mask: usize,
    capacity: usize,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("segment_count", &self.segments.len())
            .field("capacity", &self.capacity)
            .field("used_bytes", &self.used_bytes())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Creates a builder for a store holding up to `capacity` bytes.
    #[must_use]
    pub const fn builder(capacity: usize) -> MemoryStoreBuilder {
        MemoryStoreBuilder::new(capacity)
    }

    pub(crate) fn from_segments(segments: Vec<Segment>, capacity: usize) -> Self {
        debug_assert!(segments.len().is_power_of_two(), "segment count must be a power of two");
        let mask = segments.len() - 1;
        Self {
            segments: segments.into(),
            mask,
            capacity,
        }
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns the configured capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the bytes currently charged across all segments.
    ///
    /// Acquires every segment's read lock in turn, so the result is not an atomic snapshot.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.segments.iter().map(Segment::used_bytes).sum()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        for segment in &*self.segments {
            segment.clear();
        }
    }

    #[expect(clippy::cast_possible_truncation, reason = "only the low bits select a segment")]
    fn segment(&self, key: &[u8]) -> &Segment {
        &self.segments[xxh3_64(key) as usize & self.mask]
    }
}

impl ByteStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.segment(key).get(key)
    }

    fn set(&self, key: &[u8], value: Bytes) -> Result<(), Error> {
        self.segment(key).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> bool {
        self.segment(key).delete(key)
    }

    fn len(&self) -> Option<u64> {
        Some(self.entry_count() as u64)
    }
}
