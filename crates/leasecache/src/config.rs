// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Validated lease cache configuration.

use std::time::Duration;

use crate::{ConfigError, Result};

/// Default number of shards.
pub const DEFAULT_SHARD_COUNT: u32 = 1024;

/// Default number of lease slots per shard.
pub const DEFAULT_SLOTS_PER_SHARD: u32 = 16;

/// Default lease lifetime.
pub const DEFAULT_LEASE_EXPIRY: Duration = Duration::from_secs(30);

/// Immutable, validated sizing of the lease layer.
///
/// Shard and slot counts are always powers of two; the lease expiry is a whole number of
/// seconds, at least one. Build one with [`LeaseConfig::builder`], or use
/// [`LeaseConfig::default`] for 1024 shards of 16 slots with a 30 second expiry.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use leasecache::LeaseConfig;
///
/// let config = LeaseConfig::builder()
///     .shard_count(120)
///     .slots_per_shard(5)
///     .lease_expiry(Duration::from_secs(10))
///     .build()?;
///
/// assert_eq!(config.shard_count(), 128);
/// assert_eq!(config.slots_per_shard(), 8);
/// assert_eq!(config.lease_expiry(), Duration::from_secs(10));
/// # Ok::<(), leasecache::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseConfig {
    shard_count: u32,
    slots_per_shard: u32,
    lease_expiry_secs: u32,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            slots_per_shard: DEFAULT_SLOTS_PER_SHARD,
            lease_expiry_secs: 30,
        }
    }
}

impl LeaseConfig {
    /// Creates a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> LeaseConfigBuilder {
        LeaseConfigBuilder::default()
    }

    /// Number of independently locked lease tables. Always a power of two.
    #[must_use]
    pub const fn shard_count(&self) -> u32 {
        self.shard_count
    }

    /// Number of lease slots in each table. Always a power of two.
    #[must_use]
    pub const fn slots_per_shard(&self) -> u32 {
        self.slots_per_shard
    }

    /// Age after which a granted lease can be reclaimed.
    #[must_use]
    pub fn lease_expiry(&self) -> Duration {
        Duration::from_secs(u64::from(self.lease_expiry_secs))
    }

    pub(crate) const fn lease_expiry_secs(&self) -> u32 {
        self.lease_expiry_secs
    }

    /// Mask selecting a shard from the low bits of a key hash.
    pub(crate) const fn shard_mask(&self) -> u32 {
        self.shard_count - 1
    }
}

/// Builder for [`LeaseConfig`].
///
/// Every setting starts at its default. Nothing is validated until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct LeaseConfigBuilder {
    shard_count: u32,
    slots_per_shard: u32,
    lease_expiry: Duration,
}

impl Default for LeaseConfigBuilder {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            slots_per_shard: DEFAULT_SLOTS_PER_SHARD,
            lease_expiry: DEFAULT_LEASE_EXPIRY,
        }
    }
}

impl LeaseConfigBuilder {
    /// Sets the number of shards, rounded up to a power of two on build.
    #[must_use]
    pub const fn shard_count(mut self, shard_count: u32) -> Self {
        self.shard_count = shard_count;
        self
    }

    /// Sets the number of lease slots per shard, rounded up to a power of two on build.
    #[must_use]
    pub const fn slots_per_shard(mut self, slots_per_shard: u32) -> Self {
        self.slots_per_shard = slots_per_shard;
        self
    }

    /// Sets the lease lifetime. Sub-second precision is truncated.
    #[must_use]
    pub const fn lease_expiry(mut self, lease_expiry: Duration) -> Self {
        self.lease_expiry = lease_expiry;
        self
    }

    /// Validates and normalizes the settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a count is zero or too large to round up to a power of two,
    /// or if the lease expiry is shorter than one second or longer than `u32::MAX` seconds.
    pub fn build(self) -> Result<LeaseConfig> {
        if self.shard_count == 0 {
            return Err(ConfigError::new("shard count must be greater than zero"));
        }
        let shard_count = ceil_power_of_two(self.shard_count).ok_or_else(|| ConfigError::new("shard count is too large"))?;

        if self.slots_per_shard == 0 {
            return Err(ConfigError::new("slots per shard must be greater than zero"));
        }
        let slots_per_shard =
            ceil_power_of_two(self.slots_per_shard).ok_or_else(|| ConfigError::new("slots per shard is too large"))?;

        let Ok(lease_expiry_secs) = u32::try_from(self.lease_expiry.as_secs()) else {
            return Err(ConfigError::new("lease expiry is too long"));
        };
        if lease_expiry_secs == 0 {
            return Err(ConfigError::new("lease expiry must be at least one second"));
        }

        Ok(LeaseConfig {
            shard_count,
            slots_per_shard,
            lease_expiry_secs,
        })
    }
}

/// Rounds `n` up to the next power of two. Zero rounds to one; `None` on overflow.
#[must_use]
pub fn ceil_power_of_two(n: u32) -> Option<u32> {
    n.checked_next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_power_of_two_values() {
        assert_eq!(ceil_power_of_two(100), Some(128));
        assert_eq!(ceil_power_of_two(16), Some(16));
        assert_eq!(ceil_power_of_two(255), Some(256));
        assert_eq!(ceil_power_of_two(1), Some(1));
        assert_eq!(ceil_power_of_two(0), Some(1));
        assert_eq!(ceil_power_of_two(1 << 31), Some(1 << 31));
        assert_eq!(ceil_power_of_two((1 << 31) + 1), None);
    }

    #[test]
    fn defaults() {
        let config = LeaseConfig::builder().build().expect("defaults are valid");
        assert_eq!(config, LeaseConfig::default());
        assert_eq!(config.shard_count(), 1024);
        assert_eq!(config.slots_per_shard(), 16);
        assert_eq!(config.lease_expiry(), Duration::from_secs(30));
        assert_eq!(config.shard_mask(), 1023);
    }

    #[test]
    fn counts_are_rounded_up() {
        let config = LeaseConfig::builder()
            .shard_count(120)
            .slots_per_shard(5)
            .build()
            .expect("valid configuration");
        assert_eq!(config.shard_count(), 128);
        assert_eq!(config.shard_mask(), 0x7f);
        assert_eq!(config.slots_per_shard(), 8);
    }

    #[test]
    fn sub_second_expiry_is_truncated() {
        let config = LeaseConfig::builder()
            .lease_expiry(Duration::from_millis(2500))
            .build()
            .expect("valid configuration");
        assert_eq!(config.lease_expiry(), Duration::from_secs(2));
        assert_eq!(config.lease_expiry_secs(), 2);
    }

    #[test]
    fn rejects_zero_shards() {
        let err = LeaseConfig::builder().shard_count(0).build().expect_err("zero shards");
        assert_eq!(err.reason(), "shard count must be greater than zero");
    }

    #[test]
    fn rejects_zero_slots() {
        let err = LeaseConfig::builder().slots_per_shard(0).build().expect_err("zero slots");
        assert_eq!(err.reason(), "slots per shard must be greater than zero");
    }

    #[test]
    fn rejects_counts_that_cannot_round_up() {
        let err = LeaseConfig::builder().shard_count(u32::MAX).build().expect_err("overflow");
        assert_eq!(err.reason(), "shard count is too large");

        let err = LeaseConfig::builder().slots_per_shard(u32::MAX).build().expect_err("overflow");
        assert_eq!(err.reason(), "slots per shard is too large");
    }

    #[test]
    fn rejects_expiry_shorter_than_a_second() {
        let err = LeaseConfig::builder()
            .lease_expiry(Duration::from_millis(999))
            .build()
            .expect_err("expiry rounds to zero");
        assert_eq!(err.reason(), "lease expiry must be at least one second");
    }

    #[test]
    fn rejects_expiry_beyond_u32_seconds() {
        let err = LeaseConfig::builder()
            .lease_expiry(Duration::from_secs(u64::from(u32::MAX) + 1))
            .build()
            .expect_err("expiry overflows");
        assert_eq!(err.reason(), "lease expiry is too long");
    }
}
