//! Condition operators and their typed comparators
//!
//! Every operator resolves to one comparator family when a condition is
//! decoded. Acceptable values are parsed into the family's type at that point;
//! a value that does not parse is kept as an empty slot.

use super::condition::ContextValue;
use chrono::{DateTime, FixedOffset};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// String equals (case-sensitive)
    StringEquals,
    /// String differs (case-sensitive)
    StringNotEquals,
    /// String equals ignoring case
    StringEqualsIgnoreCase,
    /// String differs ignoring case
    StringNotEqualsIgnoreCase,
    /// Context value contains the acceptable value
    StringLike,
    /// Context value does not contain the acceptable value
    StringNotLike,
    NumericEquals,
    NumericNotEquals,
    NumericLessThan,
    NumericLessThanEquals,
    NumericGreaterThan,
    NumericGreaterThanEquals,
    /// Date equals (RFC3339)
    DateEquals,
    DateNotEquals,
    DateLessThan,
    DateLessThanEquals,
    DateGreaterThan,
    DateGreaterThanEquals,
    /// Boolean equals
    Bool,
    /// Address equals an IP or falls inside a CIDR block
    #[serde(rename = "IPAddress")]
    IpAddress,
    /// Address differs from an IP or falls outside a CIDR block
    #[serde(rename = "NotIPAddress")]
    NotIpAddress,
}

impl ConditionOperator {
    /// All known operators
    pub const ALL: [ConditionOperator; 21] = [
        ConditionOperator::StringEquals,
        ConditionOperator::StringNotEquals,
        ConditionOperator::StringEqualsIgnoreCase,
        ConditionOperator::StringNotEqualsIgnoreCase,
        ConditionOperator::StringLike,
        ConditionOperator::StringNotLike,
        ConditionOperator::NumericEquals,
        ConditionOperator::NumericNotEquals,
        ConditionOperator::NumericLessThan,
        ConditionOperator::NumericLessThanEquals,
        ConditionOperator::NumericGreaterThan,
        ConditionOperator::NumericGreaterThanEquals,
        ConditionOperator::DateEquals,
        ConditionOperator::DateNotEquals,
        ConditionOperator::DateLessThan,
        ConditionOperator::DateLessThanEquals,
        ConditionOperator::DateGreaterThan,
        ConditionOperator::DateGreaterThanEquals,
        ConditionOperator::Bool,
        ConditionOperator::IpAddress,
        ConditionOperator::NotIpAddress,
    ];

    /// Policy name of this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::StringEquals => "StringEquals",
            ConditionOperator::StringNotEquals => "StringNotEquals",
            ConditionOperator::StringEqualsIgnoreCase => "StringEqualsIgnoreCase",
            ConditionOperator::StringNotEqualsIgnoreCase => "StringNotEqualsIgnoreCase",
            ConditionOperator::StringLike => "StringLike",
            ConditionOperator::StringNotLike => "StringNotLike",
            ConditionOperator::NumericEquals => "NumericEquals",
            ConditionOperator::NumericNotEquals => "NumericNotEquals",
            ConditionOperator::NumericLessThan => "NumericLessThan",
            ConditionOperator::NumericLessThanEquals => "NumericLessThanEquals",
            ConditionOperator::NumericGreaterThan => "NumericGreaterThan",
            ConditionOperator::NumericGreaterThanEquals => "NumericGreaterThanEquals",
            ConditionOperator::DateEquals => "DateEquals",
            ConditionOperator::DateNotEquals => "DateNotEquals",
            ConditionOperator::DateLessThan => "DateLessThan",
            ConditionOperator::DateLessThanEquals => "DateLessThanEquals",
            ConditionOperator::DateGreaterThan => "DateGreaterThan",
            ConditionOperator::DateGreaterThanEquals => "DateGreaterThanEquals",
            ConditionOperator::Bool => "Bool",
            ConditionOperator::IpAddress => "IPAddress",
            ConditionOperator::NotIpAddress => "NotIPAddress",
        }
    }

    /// Build the comparator for one attribute's acceptable values
    pub fn comparator(&self, values: &[String]) -> Comparator {
        use ConditionOperator::*;

        match self {
            StringEquals => Comparator::string(StringOp::Equals, values),
            StringNotEquals => Comparator::string(StringOp::NotEquals, values),
            StringEqualsIgnoreCase => Comparator::string(StringOp::EqualsIgnoreCase, values),
            StringNotEqualsIgnoreCase => {
                Comparator::string(StringOp::NotEqualsIgnoreCase, values)
            }
            StringLike => Comparator::string(StringOp::Contains, values),
            StringNotLike => Comparator::string(StringOp::NotContains, values),
            NumericEquals => Comparator::numeric(OrderOp::Equals, values),
            NumericNotEquals => Comparator::numeric(OrderOp::NotEquals, values),
            NumericLessThan => Comparator::numeric(OrderOp::LessThan, values),
            NumericLessThanEquals => Comparator::numeric(OrderOp::LessThanEquals, values),
            NumericGreaterThan => Comparator::numeric(OrderOp::GreaterThan, values),
            NumericGreaterThanEquals => Comparator::numeric(OrderOp::GreaterThanEquals, values),
            DateEquals => Comparator::date(OrderOp::Equals, values),
            DateNotEquals => Comparator::date(OrderOp::NotEquals, values),
            DateLessThan => Comparator::date(OrderOp::LessThan, values),
            DateLessThanEquals => Comparator::date(OrderOp::LessThanEquals, values),
            DateGreaterThan => Comparator::date(OrderOp::GreaterThan, values),
            DateGreaterThanEquals => Comparator::date(OrderOp::GreaterThanEquals, values),
            Bool => Comparator::Bool(values.iter().map(|v| parse_bool(v)).collect()),
            IpAddress => Comparator::ip(false, values),
            NotIpAddress => Comparator::ip(true, values),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for operator names outside the known set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown condition operator {:?}", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for ConditionOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionOperator::ALL
            .iter()
            .find(|op| op.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// String comparison performed against each acceptable value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    Equals,
    NotEquals,
    EqualsIgnoreCase,
    NotEqualsIgnoreCase,
    Contains,
    NotContains,
}

impl StringOp {
    fn folds_case(self) -> bool {
        matches!(self, StringOp::EqualsIgnoreCase | StringOp::NotEqualsIgnoreCase)
    }

    /// `expected` is already folded for the ignore-case variants
    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            StringOp::Equals | StringOp::EqualsIgnoreCase => actual == expected,
            StringOp::NotEquals | StringOp::NotEqualsIgnoreCase => actual != expected,
            StringOp::Contains => actual.contains(expected),
            StringOp::NotContains => !actual.contains(expected),
        }
    }
}

/// Ordering comparison of `context` against `acceptable`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanEquals,
    GreaterThan,
    GreaterThanEquals,
}

impl OrderOp {
    pub fn holds<T: PartialOrd>(self, context: &T, acceptable: &T) -> bool {
        match self {
            OrderOp::Equals => context == acceptable,
            OrderOp::NotEquals => context != acceptable,
            OrderOp::LessThan => context < acceptable,
            OrderOp::LessThanEquals => context <= acceptable,
            OrderOp::GreaterThan => context > acceptable,
            OrderOp::GreaterThanEquals => context >= acceptable,
        }
    }
}

/// Acceptable IP value: a single address, a CIDR block, or garbage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpRule {
    Addr(IpAddr),
    Net(IpNet),
    Invalid,
}

impl IpRule {
    fn parse(value: &str) -> Self {
        if let Ok(addr) = value.parse::<IpAddr>() {
            return IpRule::Addr(addr.to_canonical());
        }
        match value.parse::<IpNet>() {
            Ok(net) => IpRule::Net(net),
            Err(_) => IpRule::Invalid,
        }
    }

    /// `None` when the rule itself is unusable
    fn covers(&self, ip: &IpAddr) -> Option<bool> {
        match self {
            IpRule::Addr(addr) => Some(addr == ip),
            IpRule::Net(net) => Some(net.contains(ip)),
            IpRule::Invalid => None,
        }
    }
}

/// Strongly typed comparison over one attribute's acceptable values
///
/// Matching is a disjunction: any one acceptable value satisfying the
/// comparison is enough. Unparsable acceptable values never satisfy it,
/// except that `DateNotEquals` holds between a timestamp and garbage.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparator {
    String { op: StringOp, values: Vec<String> },
    Numeric { op: OrderOp, values: Vec<Option<i64>> },
    Date {
        op: OrderOp,
        values: Vec<Option<DateTime<FixedOffset>>>,
    },
    Bool(Vec<Option<bool>>),
    Ip { negate: bool, values: Vec<IpRule> },
}

impl Comparator {
    fn string(op: StringOp, values: &[String]) -> Self {
        let values = if op.folds_case() {
            values.iter().map(|v| fold_case(v)).collect()
        } else {
            values.to_vec()
        };
        Comparator::String { op, values }
    }

    fn numeric(op: OrderOp, values: &[String]) -> Self {
        Comparator::Numeric {
            op,
            values: values.iter().map(|v| v.parse::<i64>().ok()).collect(),
        }
    }

    fn date(op: OrderOp, values: &[String]) -> Self {
        Comparator::Date {
            op,
            values: values.iter().map(|v| parse_date(v)).collect(),
        }
    }

    fn ip(negate: bool, values: &[String]) -> Self {
        Comparator::Ip {
            negate,
            values: values.iter().map(|v| IpRule::parse(v)).collect(),
        }
    }

    /// Compare a context value against the acceptable values
    pub fn matches(&self, value: &ContextValue) -> bool {
        match self {
            Comparator::String { op, values } => {
                let actual = value.as_text();
                let actual = if op.folds_case() {
                    fold_case(&actual)
                } else {
                    actual.into_owned()
                };
                values.iter().any(|expected| op.holds(&actual, expected))
            }
            Comparator::Numeric { op, values } => match value.as_integer() {
                Some(actual) => values.iter().flatten().any(|v| op.holds(&actual, v)),
                None => false,
            },
            Comparator::Date { op, values } => {
                let actual = value.as_str().and_then(parse_date);
                values.iter().any(|expected| match (&actual, expected) {
                    (Some(actual), Some(expected)) => op.holds(actual, expected),
                    // A timestamp is never equal to garbage
                    (Some(_), None) | (None, Some(_)) => *op == OrderOp::NotEquals,
                    (None, None) => false,
                })
            }
            Comparator::Bool(values) => match value.as_bool() {
                Some(actual) => values.iter().flatten().any(|v| *v == actual),
                None => false,
            },
            Comparator::Ip { negate, values } => {
                let ip = match value.as_str().and_then(|s| s.parse::<IpAddr>().ok()) {
                    Some(ip) => ip.to_canonical(),
                    None => return false,
                };
                values
                    .iter()
                    .filter_map(|rule| rule.covers(&ip))
                    .any(|covered| covered != *negate)
            }
        }
    }
}

/// Simple case folding, one character at a time
///
/// Characters in the same case orbit fold together (`ς`, `σ` and `Σ` all
/// become `σ`); multi-character expansions such as `ß` -> `SS` are skipped.
pub fn fold_case(value: &str) -> String {
    value.chars().map(fold_char).collect()
}

fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    let upper = match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    };
    let mut lower = upper.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => upper,
    }
}

/// RFC3339 timestamp; anything else is `None`
pub fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    value.parse::<bool>().ok()
}
