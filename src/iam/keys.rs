//! Condition keys and the parsers that fill them
//!
//! A condition key names one request attribute (`inf:SourceIP`,
//! `inf:CurrentTime`, ...). Each key has a parser that extracts a single
//! scalar from a transport-neutral view of the request.

use super::condition::{ConditionContext, ContextValue};
use chrono::{SecondsFormat, Utc};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

/// Source address condition key
pub const SOURCE_IP_KEY: &str = "inf:SourceIP";
/// Current time condition key
pub const CURRENT_TIME_KEY: &str = "inf:CurrentTime";
/// Calling service condition key
pub const SERVICE_NAME_KEY: &str = "iam:ServiceName";

pub const X_CLIENT_IP: &str = "x-client-ip";
pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_SERVICE_NAME: &str = "x-service-name";

/// The parts of an incoming request that condition parsers look at
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    remote_addr: String,
    headers: HashMap<String, String>,
}

impl RequestInfo {
    /// `remote_addr` is the peer address, usually `host:port`
    pub fn new(remote_addr: impl Into<String>) -> Self {
        RequestInfo {
            remote_addr: remote_addr.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header; names are case-insensitive
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Header value, `None` when absent or empty
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }
}

/// Extracts one condition attribute from a request
pub trait ConditionParser: Send + Sync {
    /// `None` when the request carries nothing for this key
    fn parse_condition(&self, request: &RequestInfo) -> Option<ContextValue>;
}

/// Client address, honouring proxy headers
///
/// Precedence: `x-client-ip`, `X-Real-IP`, `X-Forwarded-For`, then the host
/// part of the peer address. IPv6 loopback is reported as `127.0.0.1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceIp;

impl ConditionParser for SourceIp {
    fn parse_condition(&self, request: &RequestInfo) -> Option<ContextValue> {
        let addr = request
            .header(X_CLIENT_IP)
            .or_else(|| request.header(X_REAL_IP))
            .or_else(|| request.header(X_FORWARDED_FOR))
            .map(str::to_string)
            .or_else(|| host_part(request.remote_addr()))?;

        if addr == "::1" {
            return Some(ContextValue::from("127.0.0.1"));
        }
        Some(ContextValue::from(addr))
    }
}

fn host_part(remote_addr: &str) -> Option<String> {
    if let Ok(sock) = remote_addr.parse::<SocketAddr>() {
        return Some(sock.ip().to_string());
    }
    match remote_addr.rsplit_once(':') {
        Some((host, _port)) if !host.is_empty() => {
            Some(host.trim_start_matches('[').trim_end_matches(']').to_string())
        }
        _ => None,
    }
}

/// Current UTC time as RFC3339 with a `Z` suffix
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentTime;

impl ConditionParser for CurrentTime {
    fn parse_condition(&self, _request: &RequestInfo) -> Option<ContextValue> {
        Some(ContextValue::from(
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
    }
}

/// Name of the calling service from `X-Service-Name`
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceName;

impl ConditionParser for ServiceName {
    fn parse_condition(&self, request: &RequestInfo) -> Option<ContextValue> {
        request.header(X_SERVICE_NAME).map(ContextValue::from)
    }
}

/// Maps condition keys to their parsers
#[derive(Default)]
pub struct ConditionKeyRegistry {
    parsers: BTreeMap<String, Box<dyn ConditionParser>>,
}

impl ConditionKeyRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in keys
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SOURCE_IP_KEY, SourceIp);
        registry.register(CURRENT_TIME_KEY, CurrentTime);
        registry.register(SERVICE_NAME_KEY, ServiceName);
        registry
    }

    /// Register a parser, replacing any previous one for the key
    pub fn register(&mut self, key: impl Into<String>, parser: impl ConditionParser + 'static) {
        self.parsers.insert(key.into(), Box::new(parser));
    }

    pub fn get(&self, key: &str) -> Option<&dyn ConditionParser> {
        self.parsers.get(key).map(|p| p.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Run every parser; keys without a value are left out
    pub fn build_context(&self, request: &RequestInfo) -> ConditionContext {
        self.parsers
            .iter()
            .filter_map(|(key, parser)| {
                parser
                    .parse_condition(request)
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }
}
