// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key hashing.
//!
//! One 64-bit `xxh3` hash serves two purposes: its upper half is the slot fingerprint and its
//! lower half selects the shard. Using disjoint bits keeps shard choice independent of
//! fingerprint collisions.

use xxhash_rust::xxh3::xxh3_64;

/// Where a key lives: the shard that owns it and its fingerprint inside that shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyHash {
    pub(crate) fingerprint: u32,
    pub(crate) shard: usize,
}

impl KeyHash {
    /// Hashes `key` and routes it with `shard_mask` (shard count minus one).
    pub(crate) fn of(key: &[u8], shard_mask: u32) -> Self {
        Self::split(xxh3_64(key), shard_mask)
    }

    #[expect(clippy::cast_possible_truncation, reason = "each half of the hash is used separately")]
    pub(crate) const fn split(hash: u64, shard_mask: u32) -> Self {
        Self {
            fingerprint: (hash >> 32) as u32,
            shard: ((hash as u32) & shard_mask) as usize,
        }
    }
}
