//! Cross-module tests for IAM matching and conditions

use super::*;
use crate::error::PolicyError;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_request_to_decision() {
    let matcher = PatternMatcher::default();
    let registry = ConditionKeyRegistry::with_defaults();

    let statement: PolicyStatement = serde_json::from_value(json!({
        "effect": "Allow",
        "actions": ["ecs:Describe*", "ecs:List*"],
        "resources": ["acs:ecs:*:*:instance/*"],
        "conditions": {
            "IPAddress": {"inf:SourceIP": ["192.168.234.0/24"]},
            "DateGreaterThan": {"inf:CurrentTime": ["2000-01-01T00:00:00Z"]}
        }
    }))
    .unwrap();

    let inside = RequestInfo::new("10.0.0.5:443").with_header("X-Real-IP", "192.168.234.50");
    let ctx = registry.build_context(&inside);
    assert!(statement
        .applies(
            &matcher,
            "ecs:DescribeInstances",
            "acs:ecs:cn-hangzhou:123:instance/i-001",
            &ctx
        )
        .unwrap());

    let outside = RequestInfo::new("203.0.113.9:443");
    let ctx = registry.build_context(&outside);
    assert!(!statement
        .applies(
            &matcher,
            "ecs:DescribeInstances",
            "acs:ecs:cn-hangzhou:123:instance/i-001",
            &ctx
        )
        .unwrap());
}

#[test]
fn test_context_roundtrip_through_json() {
    let registry = ConditionKeyRegistry::with_defaults();
    let request = RequestInfo::new("127.0.0.1:80").with_header("X-Service-Name", "ecs.aliyuncs.com");
    let ctx = registry.build_context(&request);

    let ctx_json = serde_json::to_string(&ctx).unwrap();
    let condition = json!({
        "StringEquals": {"iam:ServiceName": ["ecs.aliyuncs.com"]},
        "IPAddress": {"inf:SourceIP": ["127.0.0.0/8"]}
    });

    assert!(evaluate_conditions(&ctx_json, &condition.to_string()).unwrap());
}

#[test]
fn test_literal_patterns_need_exact_equality() {
    let matcher = PatternMatcher::default();
    let cases = [
        ("ecs:Run", "ecs:Run", true),
        ("ecs:Run", "ecs:run", false),
        ("ecs:Run", "ecs:Ru", false),
        ("ecs:Run", "ecs:Run ", false),
        ("a.b", "a.b", true),
        ("axb", "a.b", false),
    ];

    for (candidate, pattern, expected) in cases {
        assert_eq!(
            matcher.matches(candidate, pattern).unwrap(),
            expected,
            "{candidate} vs {pattern}"
        );
    }
}

#[test]
fn test_template_and_wildcard_are_independent() {
    let matcher = PatternMatcher::default();
    let template = compile_template("foo:bar.baz:<[0-9]{2,10}>", b'<', b'>').unwrap();

    // A template never enters the wildcard cache
    assert!(template.is_match("foo:bar.baz:123").unwrap());
    assert!(matcher.cache().is_empty());

    // `<`, `>` and braces are literal to the wildcard matcher
    assert!(matcher
        .matches("foo:bar.baz:<[0-9]{2,10}>", "foo:bar.baz:<*>")
        .unwrap());
    assert!(!matcher.matches("foo:bar.baz:123", "foo:bar.baz:<*>").unwrap());
}

#[test]
fn test_structural_errors_cache_nothing() {
    let matcher = PatternMatcher::default();
    let err = compile_template("foo:<bar", b'<', b'>').unwrap_err();
    assert!(matches!(err, PolicyError::UnbalancedDelimiters { .. }));
    assert!(!err.is_evaluation_failure());
    assert!(matcher.cache().is_empty());
}

#[test]
fn test_timeout_is_an_error_not_a_denial() {
    let matcher = PatternMatcher::default();
    let compiled = matcher.compiled("ecs:*x*y").unwrap();

    let err = compiled
        .check_budget(matcher.match_timeout() + Duration::from_millis(1))
        .unwrap_err();
    assert!(matches!(err, PolicyError::MatchTimeout { .. }));
    assert!(err.is_evaluation_failure());

    // Inside the budget the verdict comes from the regex
    assert!(compiled.check_budget(matcher.match_timeout()).is_ok());
    assert!(matcher.matches("ecs:axby", "ecs:*x*y").unwrap());
}

#[test]
fn test_sub_millisecond_budget_still_matches() {
    let config = crate::MatcherConfig::new().with_match_timeout(Duration::from_micros(900));
    let matcher = PatternMatcher::new(&config);
    assert_eq!(matcher.match_timeout(), Duration::from_millis(1));
    assert!(matcher.matches("ecs:DescribeInstances", "ecs:*").unwrap());

    let matcher = PatternMatcher::new(&crate::MatcherConfig::new().with_match_timeout(Duration::ZERO));
    assert_eq!(matcher.match_timeout(), Duration::from_millis(250));
}

#[test]
fn test_condition_set_reuse() {
    let condition = parse_condition(
        r#"{"NumericLessThanEquals": {"acs:Quota": ["10"]}, "StringNotLike": {"acs:Path": ["/secret"]}}"#,
    )
    .unwrap();
    let set = ConditionSet::new(&condition);

    let ok = parse_context(r#"{"acs:Quota": 10, "acs:Path": "/public/a"}"#).unwrap();
    let over = parse_context(r#"{"acs:Quota": "11", "acs:Path": "/public/a"}"#).unwrap();
    let secret = parse_context(r#"{"acs:Quota": 1, "acs:Path": "/secret/a"}"#).unwrap();

    assert!(set.evaluate(&ok));
    assert!(!set.evaluate(&over));
    assert!(!set.evaluate(&secret));
    // Decoded sets are pure; re-evaluation gives the same answers
    assert!(set.evaluate(&ok));
}
