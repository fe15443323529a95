//! IAM policy statement structure
//!
//! A statement names actions and resources as wildcard patterns and may carry
//! conditions. This module answers whether a single statement applies to a
//! request; combining the effects of several statements is left to the caller.

use super::condition::{Condition, ConditionContext, ConditionSet};
use super::matcher::PatternMatcher;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action
    Deny,
}

/// Who a statement is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "IAM", default, skip_serializing_if = "Vec::is_empty")]
    pub iam: Vec<String>,

    #[serde(rename = "Service", default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<String>,

    #[serde(rename = "Federated", default, skip_serializing_if = "Vec::is_empty")]
    pub federated: Vec<String>,
}

impl Principal {
    pub fn is_empty(&self) -> bool {
        self.iam.is_empty() && self.service.is_empty() && self.federated.is_empty()
    }
}

/// A single policy statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatement {
    /// Policy format version (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Effect of this statement
    pub effect: Effect,

    /// Resource patterns this statement applies to
    #[serde(default)]
    pub resources: Vec<String>,

    /// Action patterns this statement applies to
    #[serde(default)]
    pub actions: Vec<String>,

    #[serde(default, skip_serializing_if = "Principal::is_empty")]
    pub principal: Principal,

    /// Conditions that must hold for the statement to apply
    #[serde(default, skip_serializing_if = "Condition::is_empty")]
    pub conditions: Condition,
}

impl PolicyStatement {
    /// Create a new statement
    pub fn new(effect: Effect, actions: Vec<String>, resources: Vec<String>) -> Self {
        PolicyStatement {
            version: None,
            effect,
            resources,
            actions,
            principal: Principal::default(),
            conditions: Condition::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: Condition) -> Self {
        self.conditions = conditions;
        self
    }

    /// Parse a statement from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the statement to JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check whether this statement covers the action, resource, and context
    ///
    /// Each entry of `actions` and `resources` is itself a pattern list.
    pub fn applies(
        &self,
        matcher: &PatternMatcher,
        action: &str,
        resource: &str,
        context: &ConditionContext,
    ) -> Result<bool> {
        if !Self::any_matches(matcher, action, &self.actions)? {
            return Ok(false);
        }

        if !Self::any_matches(matcher, resource, &self.resources)? {
            return Ok(false);
        }

        Ok(ConditionSet::new(&self.conditions).evaluate(context))
    }

    fn any_matches(matcher: &PatternMatcher, candidate: &str, patterns: &[String]) -> Result<bool> {
        for pattern in patterns {
            if matcher.matches(candidate, pattern)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_statement_json_shape() {
        let stmt: PolicyStatement = serde_json::from_value(json!({
            "version": "1",
            "effect": "Allow",
            "resources": ["acs:ecs:*:*:instance/*"],
            "actions": ["ecs:Describe*"],
            "principal": {"IAM": ["user/alice"]},
            "conditions": {"IPAddress": {"inf:SourceIP": ["10.0.0.0/8"]}}
        }))
        .unwrap();

        assert_eq!(stmt.effect, Effect::Allow);
        assert_eq!(stmt.principal.iam, vec!["user/alice".to_string()]);
        assert!(stmt.principal.service.is_empty());
        assert_eq!(stmt.conditions["IPAddress"]["inf:SourceIP"], vec!["10.0.0.0/8"]);
    }

    #[test]
    fn test_statement_optional_fields() {
        let stmt = PolicyStatement::from_json(r#"{"effect": "Deny"}"#).unwrap();
        assert_eq!(stmt.effect, Effect::Deny);
        assert!(stmt.actions.is_empty());
        assert!(stmt.conditions.is_empty());

        let json = stmt.to_json().unwrap();
        assert!(!json.contains("principal"));
        assert!(!json.contains("conditions"));
    }

    #[test]
    fn test_statement_applies() {
        let matcher = PatternMatcher::default();
        let stmt = PolicyStatement::new(
            Effect::Allow,
            vec!["ecs:Describe*".to_string()],
            vec!["acs:ecs:*".to_string()],
        );
        let ctx = ConditionContext::new();

        assert!(stmt.applies(&matcher, "ecs:DescribeInstances", "acs:ecs:i-1", &ctx).unwrap());
        assert!(!stmt.applies(&matcher, "ecs:CreateInstance", "acs:ecs:i-1", &ctx).unwrap());
        assert!(!stmt.applies(&matcher, "ecs:DescribeInstances", "acs:oss:b-1", &ctx).unwrap());
    }

    #[test]
    fn test_statement_with_conditions() {
        let matcher = PatternMatcher::default();
        let mut conditions = Condition::new();
        conditions
            .entry("IPAddress".to_string())
            .or_default()
            .insert("inf:SourceIP".to_string(), vec!["10.0.0.0/8".to_string()]);

        let stmt = PolicyStatement::new(Effect::Allow, vec!["*".to_string()], vec!["*".to_string()])
            .with_conditions(conditions);

        let mut ctx = ConditionContext::new();
        assert!(!stmt.applies(&matcher, "ecs:Run", "acs:ecs:i-1", &ctx).unwrap());

        ctx.insert("inf:SourceIP".to_string(), "10.2.3.4".into());
        assert!(stmt.applies(&matcher, "ecs:Run", "acs:ecs:i-1", &ctx).unwrap());

        ctx.insert("inf:SourceIP".to_string(), "11.2.3.4".into());
        assert!(!stmt.applies(&matcher, "ecs:Run", "acs:ecs:i-1", &ctx).unwrap());
    }

    #[test]
    fn test_comma_separated_entries() {
        let matcher = PatternMatcher::default();
        let stmt = PolicyStatement::new(
            Effect::Deny,
            vec!["ram:Delete*,ram:Update*".to_string()],
            vec!["*".to_string()],
        );
        let ctx = ConditionContext::new();
        assert!(stmt.applies(&matcher, "ram:UpdateUser", "r", &ctx).unwrap());
        assert!(!stmt.applies(&matcher, "ram:GetUser", "r", &ctx).unwrap());
    }
}
