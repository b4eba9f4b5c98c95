use super::contract::RequestMatcher;
use crate::http::HttpRequest;

/// Matches paths starting with a prefix; an empty prefix matches everything
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.trim().to_string() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl RequestMatcher for PathPrefixMatcher {
    fn matches(&self, request: &HttpRequest) -> bool {
        self.prefix.is_empty() || request.path().starts_with(&self.prefix)
    }
}

/// Case-insensitive host match, ignoring any port on the request host
#[derive(Debug, Clone)]
pub struct HostMatcher {
    host: String,
}

impl HostMatcher {
    pub fn new(host: &str) -> Self {
        Self { host: host.trim().to_ascii_lowercase() }
    }
}

impl RequestMatcher for HostMatcher {
    fn matches(&self, request: &HttpRequest) -> bool {
        let host = request.host();
        let host = host.rsplit_once(':').map_or(host, |(name, port)| {
            if port.chars().all(|c| c.is_ascii_digit()) { name } else { host }
        });
        host.eq_ignore_ascii_case(&self.host)
    }
}

/// Matches every request
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyRequestMatcher;

impl RequestMatcher for AnyRequestMatcher {
    fn matches(&self, _request: &HttpRequest) -> bool {
        true
    }
}
