//! Condition evaluation for IAM policies
//!
//! A condition maps operator names to per-attribute lists of acceptable
//! values:
//!
//! ```json
//! {
//!   "IPAddress":    { "inf:SourceIP":    ["10.0.0.0/8"] },
//!   "DateLessThan": { "inf:CurrentTime": ["2024-01-12T06:59:00Z"] }
//! }
//! ```
//!
//! Every operator block must hold (AND), every attribute inside a block must
//! hold (AND), and an attribute holds when any of its values satisfies the
//! operator (OR). Missing attributes and unknown operators fail closed.

use super::operator::{Comparator, ConditionOperator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Attribute name -> acceptable values, as written in a policy
pub type ConditionValue = BTreeMap<String, Vec<String>>;

/// Operator name -> attribute constraints, as written in a policy
pub type Condition = BTreeMap<String, ConditionValue>;

/// Facts about the current request
pub type ConditionContext = HashMap<String, ContextValue>;

/// A single scalar request attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl ContextValue {
    /// The value as a string, rendering numbers and booleans
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            ContextValue::String(s) => Cow::Borrowed(s),
            ContextValue::Number(n) => Cow::Owned(n.to_string()),
            ContextValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        }
    }

    /// The value only if it is a JSON string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ContextValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view: whole JSON numbers or decimal strings
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ContextValue::Number(n) => n.as_i64(),
            ContextValue::String(s) => s.parse().ok(),
            ContextValue::Bool(_) => None,
        }
    }

    /// Boolean view: JSON booleans or the strings `true` / `false`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ContextValue::Bool(b) => Some(*b),
            ContextValue::String(s) => s.parse().ok(),
            ContextValue::Number(_) => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::String(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Number(value.into())
    }
}

/// One attribute constraint with its comparator already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeCheck {
    pub key: String,
    pub comparator: Comparator,
}

/// One operator block of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionBlock {
    /// Operator outside the known set; never satisfied
    Unknown(String),
    Known {
        operator: ConditionOperator,
        checks: Vec<AttributeCheck>,
    },
}

/// A condition decoded into typed comparators
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionSet {
    blocks: Vec<ConditionBlock>,
}

impl ConditionSet {
    /// Resolve operators and parse acceptable values
    pub fn new(condition: &Condition) -> Self {
        let blocks = condition
            .iter()
            .map(|(name, attributes)| match name.parse::<ConditionOperator>() {
                Ok(operator) => ConditionBlock::Known {
                    operator,
                    checks: attributes
                        .iter()
                        .map(|(key, values)| AttributeCheck {
                            key: key.clone(),
                            comparator: operator.comparator(values),
                        })
                        .collect(),
                },
                Err(_) => ConditionBlock::Unknown(name.clone()),
            })
            .collect();

        ConditionSet { blocks }
    }

    pub fn blocks(&self) -> &[ConditionBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Evaluate against a request context
    ///
    /// Returns `false` at the first unknown operator, missing attribute, or
    /// unsatisfied constraint.
    pub fn evaluate(&self, context: &ConditionContext) -> bool {
        for block in &self.blocks {
            let (operator, checks) = match block {
                ConditionBlock::Unknown(name) => {
                    tracing::debug!("Unknown condition operator {:?}", name);
                    return false;
                }
                ConditionBlock::Known { operator, checks } => (operator, checks),
            };

            for check in checks {
                let value = match context.get(&check.key) {
                    Some(v) => v,
                    None => {
                        tracing::debug!("Condition key {:?} missing from context", check.key);
                        return false;
                    }
                };

                if !check.comparator.matches(value) {
                    tracing::debug!(
                        "{} not satisfied for {:?} = {}",
                        operator,
                        check.key,
                        value
                    );
                    return false;
                }
            }
        }

        true
    }
}

impl From<&Condition> for ConditionSet {
    fn from(condition: &Condition) -> Self {
        ConditionSet::new(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context(pairs: Vec<(&str, ContextValue)>) -> ConditionContext {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn make_condition(blocks: &[(&str, &str, &[&str])]) -> Condition {
        let mut condition = Condition::new();
        for (op, key, values) in blocks {
            condition
                .entry(op.to_string())
                .or_default()
                .insert(key.to_string(), values.iter().map(|v| v.to_string()).collect());
        }
        condition
    }

    #[test]
    fn test_context_value_decoding() {
        let ctx: ConditionContext =
            serde_json::from_str(r#"{"a": "x", "b": 3, "c": true}"#).unwrap();
        assert_eq!(ctx["a"], ContextValue::from("x"));
        assert_eq!(ctx["b"].as_integer(), Some(3));
        assert_eq!(ctx["c"], ContextValue::Bool(true));
    }

    #[test]
    fn test_context_rejects_collections() {
        assert!(serde_json::from_str::<ConditionContext>(r#"{"a": ["x"]}"#).is_err());
        assert!(serde_json::from_str::<ConditionContext>(r#"{"a": {"b": 1}}"#).is_err());
        assert!(serde_json::from_str::<ConditionContext>(r#"{"a": null}"#).is_err());
    }

    #[test]
    fn test_context_value_views() {
        assert_eq!(ContextValue::from(7).as_text(), "7");
        assert_eq!(ContextValue::from(false).as_text(), "false");
        assert_eq!(ContextValue::from("12").as_integer(), Some(12));
        assert_eq!(ContextValue::from("true").as_bool(), Some(true));
        assert_eq!(ContextValue::from(1).as_bool(), None);
        assert_eq!(ContextValue::from(1).as_str(), None);
    }

    #[test]
    fn test_all_blocks_must_hold() {
        let condition = make_condition(&[
            ("IPAddress", "acs:SourceIp", &["10.0.0.1"]),
            ("DateLessThan", "acs:CurrentTime", &["2024-01-12T00:00:00Z"]),
        ]);
        let set = ConditionSet::new(&condition);

        let ctx = make_context(vec![
            ("acs:SourceIp", "10.0.0.1".into()),
            ("acs:CurrentTime", "2024-01-10T00:00:00Z".into()),
        ]);
        assert!(set.evaluate(&ctx));

        let ctx = make_context(vec![
            ("acs:SourceIp", "10.0.0.1".into()),
            ("acs:CurrentTime", "2024-01-15T00:00:00Z".into()),
        ]);
        assert!(!set.evaluate(&ctx));
    }

    #[test]
    fn test_all_attributes_in_block_must_hold() {
        let condition = make_condition(&[
            ("StringEquals", "role", &["admin"]),
            ("StringEquals", "team", &["infra"]),
        ]);
        let set = ConditionSet::new(&condition);

        let ctx = make_context(vec![("role", "admin".into()), ("team", "infra".into())]);
        assert!(set.evaluate(&ctx));

        let ctx = make_context(vec![("role", "admin".into()), ("team", "web".into())]);
        assert!(!set.evaluate(&ctx));
    }

    #[test]
    fn test_missing_context_key() {
        let condition = make_condition(&[("StringEquals", "user", &["alice"])]);
        let set = ConditionSet::new(&condition);
        assert!(!set.evaluate(&ConditionContext::new())); // Missing key = condition fails
    }

    #[test]
    fn test_unknown_operator() {
        let condition = make_condition(&[
            ("StringEquals", "key", &["value"]),
            ("UnknownOperator", "key", &["value"]),
        ]);
        let set = ConditionSet::new(&condition);
        assert!(matches!(
            set.blocks().iter().find(|b| matches!(b, ConditionBlock::Unknown(_))),
            Some(ConditionBlock::Unknown(name)) if name == "UnknownOperator"
        ));

        let ctx = make_context(vec![("key", "value".into())]);
        assert!(!set.evaluate(&ctx));
    }

    #[test]
    fn test_empty_condition_holds() {
        let set = ConditionSet::new(&Condition::new());
        assert!(set.is_empty());
        assert!(set.evaluate(&ConditionContext::new()));
    }

    #[test]
    fn test_empty_operator_block_holds() {
        let mut condition = Condition::new();
        condition.insert("StringEquals".to_string(), ConditionValue::new());
        assert!(ConditionSet::new(&condition).evaluate(&ConditionContext::new()));
    }
}
