//! JSON entry points for condition evaluation
//!
//! Both inputs arrive as JSON text. Decoding failures are errors; every
//! semantic mismatch is `Ok(false)`.

use super::condition::{Condition, ConditionContext, ConditionSet};
use crate::error::{PolicyError, Result};

/// Decode a condition document
pub fn parse_condition(condition_json: &str) -> Result<Condition> {
    serde_json::from_str(condition_json).map_err(PolicyError::InvalidCondition)
}

/// Decode a request context document
pub fn parse_context(context_json: &str) -> Result<ConditionContext> {
    serde_json::from_str(context_json).map_err(PolicyError::InvalidContext)
}

/// Decide whether the context satisfies every declared condition
///
/// ```
/// use iam_match::iam::evaluate_conditions;
///
/// let context = r#"{"inf:SourceIP": "192.168.234.50"}"#;
/// let condition = r#"{"IPAddress": {"inf:SourceIP": ["192.168.234.0/24"]}}"#;
/// assert!(evaluate_conditions(context, condition).unwrap());
/// ```
pub fn evaluate_conditions(context_json: &str, condition_json: &str) -> Result<bool> {
    let condition = parse_condition(condition_json)?;
    let context = parse_context(context_json)?;

    Ok(ConditionSet::new(&condition).evaluate(&context))
}

/// Function-style entry point for rule engines that register custom matchers
///
/// Same contract as [`evaluate_conditions`].
pub fn condition_matcher(context_json: &str, condition_json: &str) -> Result<bool> {
    evaluate_conditions(context_json, condition_json)
}
