//! Matcher configuration
//!
//! Settings can be built in code or loaded from a TOML document:
//!
//! ```toml
//! cache_capacity = 1024
//! match_timeout_ms = 250
//! ```

use crate::error::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

/// Tuning knobs for [`PatternMatcher`](crate::iam::PatternMatcher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Number of compiled patterns kept in the LRU cache (0 = default)
    pub cache_capacity: usize,

    /// Wall-clock budget for a single regex evaluation, in milliseconds (0 = default)
    pub match_timeout_ms: u64,
}

impl MatcherConfig {
    /// Default number of cached patterns
    pub const DEFAULT_CACHE_CAPACITY: usize = 512;

    /// Default regex evaluation budget
    pub const DEFAULT_MATCH_TIMEOUT_MS: u64 = 250;

    /// Upper bound on the cache size
    const MAX_CACHE_CAPACITY: usize = 1 << 20;

    pub fn new() -> Self {
        MatcherConfig {
            cache_capacity: Self::DEFAULT_CACHE_CAPACITY,
            match_timeout_ms: Self::DEFAULT_MATCH_TIMEOUT_MS,
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the evaluation budget, rounded up to whole milliseconds
    pub fn with_match_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.match_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: MatcherConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate all fields
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity > Self::MAX_CACHE_CAPACITY {
            return Err(PolicyError::InvalidConfig(format!(
                "cache_capacity {} exceeds maximum of {}",
                self.cache_capacity,
                Self::MAX_CACHE_CAPACITY
            )));
        }

        Ok(())
    }

    /// Effective cache capacity; zero falls back to the default
    pub fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache_capacity)
            .or(NonZeroUsize::new(Self::DEFAULT_CACHE_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN)
    }

    /// Effective evaluation budget; zero falls back to the default
    pub fn match_timeout(&self) -> Duration {
        let millis = match self.match_timeout_ms {
            0 => Self::DEFAULT_MATCH_TIMEOUT_MS,
            ms => ms,
        };
        Duration::from_millis(millis)
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::new()
    }
}
