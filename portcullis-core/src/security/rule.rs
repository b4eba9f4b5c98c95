//! Built-in pre-authentication rules

use std::net::IpAddr;
use std::sync::Arc;

use ipnet::IpNet;
use subtle::ConstantTimeEq;

use super::contract::{RequestMatcher, Rule};
use super::error::{SecurityError, SecurityResult};
use crate::http::HttpRequest;

/// Requires a header to carry an exact value on matching requests
#[derive(Debug, Clone)]
pub struct ApiKeyHeaderRule {
    matcher: Arc<dyn RequestMatcher>,
    header_name: String,
    expected_value: String,
}

impl ApiKeyHeaderRule {
    pub fn new(
        matcher: Arc<dyn RequestMatcher>,
        header_name: &str,
        expected_value: &str,
    ) -> SecurityResult<Self> {
        let header_name = header_name.trim();
        if header_name.is_empty() {
            return Err(SecurityError::InvalidConfiguration(
                "api key rule requires a header name".to_string(),
            ));
        }
        Ok(Self {
            matcher,
            header_name: header_name.to_string(),
            expected_value: expected_value.to_string(),
        })
    }
}

impl Rule for ApiKeyHeaderRule {
    fn name(&self) -> &str {
        "api_key_header"
    }

    fn applies(&self, request: &HttpRequest) -> bool {
        self.matcher.matches(request)
    }

    fn check(&self, request: &HttpRequest) -> SecurityResult<()> {
        match request.header(&self.header_name) {
            Some(value) if bool::from(value.as_bytes().ct_eq(self.expected_value.as_bytes())) => Ok(()),
            _ => Err(SecurityError::Forbidden),
        }
    }
}

#[derive(Debug, Clone)]
enum IpMatcher {
    Exact(IpAddr),
    Net(IpNet),
}

impl IpMatcher {
    fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpMatcher::Exact(x) => x == ip,
            IpMatcher::Net(n) => n.contains(ip),
        }
    }
}

/// Networks behind the named macros accepted in allow/deny lists
fn macro_nets(name: &str) -> Vec<IpNet> {
    let cidrs: &[&str] = match name.trim().to_ascii_lowercase().as_str() {
        "private_v4" => &["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"],
        "private" | "internal" => &["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16", "fc00::/7"],
        "loopback" => &["127.0.0.0/8", "::1/128"],
        "link_local" => &["169.254.0.0/16", "fe80::/10"],
        _ => &[],
    };
    cidrs.iter().filter_map(|cidr| cidr.parse().ok()).collect()
}

fn compile_ip_matchers<S: AsRef<str>>(list: &[S]) -> SecurityResult<Vec<IpMatcher>> {
    let mut out = Vec::new();
    for raw in list {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            continue;
        }
        if let Ok(ip) = s.parse::<IpAddr>() {
            out.push(IpMatcher::Exact(ip));
            continue;
        }
        if let Ok(net) = s.parse::<IpNet>() {
            out.push(IpMatcher::Net(net));
            continue;
        }
        let nets = macro_nets(s);
        if nets.is_empty() {
            return Err(SecurityError::InvalidConfiguration(format!(
                "invalid IP, CIDR or network macro '{}'",
                s
            )));
        }
        out.extend(nets.into_iter().map(IpMatcher::Net));
    }
    Ok(out)
}

/// Allow/deny list on the client IP; deny entries take precedence
///
/// With a non-empty allow list, clients outside it (or with no known IP) are
/// rejected.
#[derive(Debug, Clone)]
pub struct IpAccessRule {
    matcher: Arc<dyn RequestMatcher>,
    allow: Vec<IpMatcher>,
    deny: Vec<IpMatcher>,
}

impl IpAccessRule {
    pub fn new<S: AsRef<str>>(
        matcher: Arc<dyn RequestMatcher>,
        allow: &[S],
        deny: &[S],
    ) -> SecurityResult<Self> {
        Ok(Self { matcher, allow: compile_ip_matchers(allow)?, deny: compile_ip_matchers(deny)? })
    }
}

impl Rule for IpAccessRule {
    fn name(&self) -> &str {
        "ip_access"
    }

    fn applies(&self, request: &HttpRequest) -> bool {
        self.matcher.matches(request)
    }

    fn check(&self, request: &HttpRequest) -> SecurityResult<()> {
        let Some(ip) = request.client_ip() else {
            return if self.allow.is_empty() {
                Ok(())
            } else {
                Err(SecurityError::RuleRejected("client address unknown".to_string()))
            };
        };

        if self.deny.iter().any(|m| m.matches(&ip)) {
            return Err(SecurityError::RuleRejected(format!("ip {} denied", ip)));
        }
        if !self.allow.is_empty() && !self.allow.iter().any(|m| m.matches(&ip)) {
            return Err(SecurityError::RuleRejected(format!("ip {} not allowed", ip)));
        }
        Ok(())
    }
}
