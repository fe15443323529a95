//! Pattern matcher for action and resource identifiers
//!
//! A policy lists identifiers as a comma-separated string. Each element is
//! either a literal, compared for exact equality, or a wildcard pattern using
//! `*`, compiled once and cached:
//!
//! ```
//! use iam_match::iam::PatternMatcher;
//!
//! let matcher = PatternMatcher::default();
//! assert!(matcher.matches("ecs:DescribeInstances", "ecs:Describe*").unwrap());
//! assert!(matcher.matches("oss:GetObject", "ecs:*,oss:GetObject").unwrap());
//! assert!(!matcher.matches("ecs:CreateInstance", "ecs:Describe*").unwrap());
//! ```

use super::cache::PatternCache;
use super::pattern::{is_wildcard, CompiledPattern};
use crate::config::MatcherConfig;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Separator between elements of a pattern list
pub const PATTERN_SEPARATOR: char = ',';

/// Matches identifiers against wildcard pattern lists
///
/// Safe to share between threads; the compiled-pattern cache is internally
/// synchronized.
pub struct PatternMatcher {
    cache: PatternCache,
    budget: Duration,
}

impl PatternMatcher {
    /// Create a matcher from a configuration
    pub fn new(config: &MatcherConfig) -> Self {
        PatternMatcher {
            cache: PatternCache::new(config.capacity()),
            budget: config.match_timeout(),
        }
    }

    /// Create a matcher holding at most `capacity` compiled patterns
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(&MatcherConfig::new().with_cache_capacity(capacity))
    }

    /// Check whether `candidate` matches any element of `patterns`
    ///
    /// A plain non-match is `Ok(false)`. Errors are reserved for patterns
    /// that fail to compile or exceed their evaluation budget.
    pub fn matches(&self, candidate: &str, patterns: &str) -> Result<bool> {
        for pattern in patterns.split(PATTERN_SEPARATOR) {
            if self.matches_one(candidate, pattern)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Like [`matches`](Self::matches), but any error counts as a non-match
    pub fn must_match(&self, candidate: &str, patterns: &str) -> bool {
        match self.matches(candidate, patterns) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!("Treating matcher error as non-match: {}", e);
                false
            }
        }
    }

    /// Match a single pattern element
    pub fn matches_one(&self, candidate: &str, pattern: &str) -> Result<bool> {
        if !is_wildcard(pattern) {
            return Ok(pattern == candidate);
        }

        self.compiled(pattern)?.is_match(candidate)
    }

    /// Fetch the compiled form of a wildcard pattern, compiling on a miss
    ///
    /// Compilation runs outside the cache lock so a slow compile never blocks
    /// lookups of other patterns.
    pub fn compiled(&self, pattern: &str) -> Result<Arc<CompiledPattern>> {
        if let Some(hit) = self.cache.get(pattern) {
            return Ok(hit);
        }

        tracing::debug!("Compiling wildcard pattern {:?}", pattern);
        let compiled = CompiledPattern::wildcard(pattern, self.budget)?;
        Ok(self.cache.get_or_insert(compiled))
    }

    /// Access the underlying cache
    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    pub fn match_timeout(&self) -> Duration {
        self.budget
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new(&MatcherConfig::default())
    }
}

/// Function-style entry point for rule engines that register custom matchers
///
/// `candidate` comes from the request, `patterns` from the policy.
pub fn iam_matcher(matcher: &PatternMatcher, candidate: &str, patterns: &str) -> Result<bool> {
    matcher.matches(candidate, patterns)
}
