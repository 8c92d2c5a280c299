// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for building a lease cache.

/// A lease cache configuration was rejected.
///
/// Returned by the builders before any shard is allocated. [`reason`](Self::reason) names the
/// offending setting; when a store could not be created the store's error is attached as the
/// cause.
///
/// # Example
///
/// ```
/// use leasecache::LeaseConfig;
///
/// let err = LeaseConfig::builder().shard_count(0).build().unwrap_err();
/// assert_eq!(err.reason(), "shard count must be greater than zero");
/// ```
#[ohno::error]
#[display("invalid lease cache configuration: {reason}")]
pub struct ConfigError {
    reason: &'static str,
}

impl ConfigError {
    /// Describes which setting was invalid.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

/// A specialized [`Result`] type for building lease caches.
pub type Result<T> = std::result::Result<T, ConfigError>;
