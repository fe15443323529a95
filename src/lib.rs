//! # iam-match - Authorization Decision Primitives
//!
//! `iam-match` answers the two questions an IAM-style authorizer asks about
//! every policy statement:
//!
//! - **Does the identifier match?** Action and resource names are compared
//!   against comma-separated wildcard pattern lists (`ecs:Describe*`).
//! - **Do the conditions hold?** Request attributes such as source IP and
//!   current time are checked against typed operators (`IPAddress`,
//!   `DateLessThan`, ...).
//!
//! Both are fail-closed: unknown operators and missing attributes evaluate to
//! `false`, while malformed input and matcher failures are errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use iam_match::iam::{evaluate_conditions, PatternMatcher};
//! use iam_match::{MatcherConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let matcher = PatternMatcher::new(&MatcherConfig::default());
//! assert!(matcher.matches("ecs:DescribeInstances", "ecs:Describe*,ecs:List*")?);
//!
//! let allowed = evaluate_conditions(
//!     r#"{"inf:CurrentTime": "2024-01-10T00:00:00Z"}"#,
//!     r#"{"DateLessThan": {"inf:CurrentTime": ["2024-01-12T06:59:00Z"]}}"#,
//! )?;
//! assert!(allowed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod iam;

pub use crate::config::MatcherConfig;
pub use crate::error::{PolicyError, Result};
pub use crate::iam::{
    evaluate_conditions, ConditionContext, ConditionOperator, ContextValue, PatternMatcher,
    PolicyStatement,
};
