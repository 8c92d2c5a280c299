// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring a [`MemoryStore`].

use leasecache_store::Error;

use crate::segment::Segment;
use crate::store::MemoryStore;

/// Default number of segments.
const DEFAULT_SEGMENTS: usize = 256;

/// Builder for a [`MemoryStore`].
///
/// Created by [`MemoryStore::builder`]. The total capacity is required; the segment count is
/// optional and is rounded up to a power of two.
///
/// # Examples
///
/// ```
/// use leasecache_memory::MemoryStore;
///
/// let store = MemoryStore::builder(1 << 20).segments(100).build()?;
/// assert_eq!(store.segment_count(), 128);
/// # Ok::<(), leasecache_store::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStoreBuilder {
    capacity: usize,
    segments: usize,
}

impl MemoryStoreBuilder {
    pub(crate) const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            segments: DEFAULT_SEGMENTS,
        }
    }

    /// Sets the number of segments. Defaults to 256.
    ///
    /// The value is rounded up to the next power of two when the store is built.
    #[must_use]
    pub const fn segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Builds the store, splitting the capacity evenly across segments.
    ///
    /// # Errors
    ///
    /// Returns an error if the capacity or segment count is zero, if the segment count cannot be
    /// rounded up to a power of two, or if the capacity is smaller than the segment count.
    pub fn build(self) -> Result<MemoryStore, Error> {
        if self.capacity == 0 {
            return Err(Error::from_message("store capacity must be greater than zero"));
        }
        if self.segments == 0 {
            return Err(Error::from_message("segment count must be greater than zero"));
        }
        let segments = self
            .segments
            .checked_next_power_of_two()
            .ok_or_else(|| Error::from_message("segment count is too large"))?;
        if self.capacity < segments {
            return Err(Error::from_message(format!(
                "store capacity of {} bytes cannot be split across {segments} segments",
                self.capacity
            )));
        }

        let budget = self.capacity / segments;
        let segments = (0..segments).map(|_| Segment::new(budget)).collect();
        Ok(MemoryStore::from_segments(segments, self.capacity))
    }
}
