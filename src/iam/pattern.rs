//! Wildcard pattern compilation
//!
//! A wildcard pattern uses `*` for "zero or more characters"; every other
//! character matches literally. Patterns compile to anchored regular
//! expressions carrying an evaluation budget.

use crate::error::{PolicyError, Result};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::time::{Duration, Instant};

/// Compiled size limit handed to the regex engine
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Wildcard character
pub const WILDCARD: char = '*';

/// Expression a wildcard expands to; `s` lets the run span newlines
const WILDCARD_EXPR: &str = "(?s:.*)";

/// Returns true if the pattern needs regex compilation
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(WILDCARD)
}

/// An anchored regex plus the time budget it is allowed per evaluation
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    budget: Duration,
}

impl CompiledPattern {
    /// Compile a wildcard pattern (`ecs:Describe*`) into `^ecs:Describe(?s:.*)$`
    pub fn wildcard(pattern: &str, budget: Duration) -> Result<Self> {
        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        expr.push('^');
        for (i, literal) in pattern.split(WILDCARD).enumerate() {
            if i > 0 {
                expr.push_str(WILDCARD_EXPR);
            }
            expr.push_str(&regex::escape(literal));
        }
        expr.push('$');

        Self::from_expression(pattern, &expr, budget)
    }

    /// Compile an already-built regular expression
    pub(crate) fn from_expression(source: &str, expr: &str, budget: Duration) -> Result<Self> {
        let regex = build_regex(expr)?;
        Ok(CompiledPattern {
            source: source.to_string(),
            regex,
            budget,
        })
    }

    /// Evaluate the candidate, reporting a budget overrun as an error
    ///
    /// The regex engine runs in linear time and cannot be interrupted, so the
    /// budget is checked once evaluation returns. A result produced after the
    /// budget expired is discarded.
    pub fn is_match(&self, candidate: &str) -> Result<bool> {
        let started = Instant::now();
        let matched = self.regex.is_match(candidate);
        self.check_budget(started.elapsed())?;
        Ok(matched)
    }

    /// Fail with `MatchTimeout` if `elapsed` overran the budget
    pub(crate) fn check_budget(&self, elapsed: Duration) -> Result<()> {
        if elapsed <= self.budget {
            return Ok(());
        }

        tracing::warn!(
            "Pattern {:?} took {:?} (budget {:?})",
            self.source,
            elapsed,
            self.budget
        );
        Err(PolicyError::MatchTimeout {
            pattern: self.source.clone(),
            elapsed,
            budget: self.budget,
        })
    }

    /// The pattern text this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The generated regular expression
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("source", &self.source)
            .field("regex", &self.regex.as_str())
            .field("budget", &self.budget)
            .finish()
    }
}

pub(crate) fn build_regex(expr: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(expr)
        .size_limit(REGEX_SIZE_LIMIT)
        .dfa_size_limit(REGEX_SIZE_LIMIT)
        .build()?)
}
