use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Unbalanced delimiters in {template:?}")]
    UnbalancedDelimiters { template: String },

    #[error("Template delimiter {0:#04x} is not a single ASCII character")]
    InvalidDelimiter(u8),

    #[error("Regex compilation failed: {0}")]
    Compile(#[from] regex::Error),

    #[error("Matching {pattern:?} exceeded its time budget ({elapsed:?} > {budget:?})")]
    MatchTimeout {
        pattern: String,
        elapsed: Duration,
        budget: Duration,
    },

    #[error("Invalid condition context: {0}")]
    InvalidContext(#[source] serde_json::Error),

    #[error("Invalid condition: {0}")]
    InvalidCondition(#[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PolicyError {
    /// True for errors raised by the matcher itself rather than by bad input.
    ///
    /// Callers use this to tell "denied" apart from "matcher malfunction".
    pub fn is_evaluation_failure(&self) -> bool {
        matches!(
            self,
            PolicyError::MatchTimeout { .. } | PolicyError::Compile(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PolicyError>;
