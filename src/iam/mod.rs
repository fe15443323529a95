//! Identity and Access Management (IAM) decision primitives
//!
//! Provides the two building blocks of an authorization check:
//! - Wildcard pattern matching for action and resource identifiers, with an
//!   LRU cache of compiled patterns and a per-evaluation time budget
//! - Template patterns embedding raw regex fragments between delimiters
//! - Condition evaluation (String, Numeric, Date, Bool, IP operations) over
//!   JSON-encoded request context
//! - Condition key parsers that turn a request into a context

mod cache;
mod condition;
mod evaluator;
mod keys;
mod matcher;
mod operator;
mod pattern;
mod policy;
mod template;

pub use cache::PatternCache;
pub use condition::{
    AttributeCheck, Condition, ConditionBlock, ConditionContext, ConditionSet, ConditionValue,
    ContextValue,
};
pub use evaluator::{condition_matcher, evaluate_conditions, parse_condition, parse_context};
pub use keys::{
    ConditionKeyRegistry, ConditionParser, CurrentTime, RequestInfo, ServiceName, SourceIp,
    CURRENT_TIME_KEY, SERVICE_NAME_KEY, SOURCE_IP_KEY,
};
pub use matcher::{iam_matcher, PatternMatcher, PATTERN_SEPARATOR};
pub use operator::{parse_date, Comparator, ConditionOperator, IpRule, OrderOp, StringOp, UnknownOperator};
pub use pattern::{is_wildcard, CompiledPattern, WILDCARD};
pub use policy::{Effect, PolicyStatement, Principal};
pub use template::{compile_template, compile_template_with_budget};

#[cfg(test)]
mod tests;
