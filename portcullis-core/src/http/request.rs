//! HTTP request representation
//!
//! The request type carries exactly what routing and security decisions need:
//! method, normalized path, decoded query, host, scheme, headers and the peer
//! address. Header names are stored lowercased.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use super::HttpError;

/// HTTP methods understood by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    CONNECT,
    TRACE,
}

impl HttpMethod {
    /// Convert method to string
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::CONNECT => "CONNECT",
            HttpMethod::TRACE => "TRACE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "CONNECT" => Ok(HttpMethod::CONNECT),
            "TRACE" => Ok(HttpMethod::TRACE),
            _ => Err(HttpError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed query parameters from URL
pub type QueryParams = HashMap<String, String>;

/// HTTP headers collection, keyed by lowercased name
pub type Headers = HashMap<String, String>;

/// An incoming request as seen by the router and the firewall layer
///
/// ```rust,ignore
/// use portcullis_core::http::{HttpMethod, HttpRequest};
///
/// let request = HttpRequest::new(HttpMethod::GET, "/users/42?expand=roles")
///     .with_header("Host", "api.example.com")
///     .with_scheme("https");
/// assert_eq!(request.path(), "/users/42");
/// assert_eq!(request.query_param("expand"), Some("roles"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    query_params: QueryParams,
    headers: Headers,
    host: Option<String>,
    scheme: String,
    remote_addr: Option<SocketAddr>,
}

impl HttpRequest {
    /// Create a request from a method and a request target (path plus optional query)
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let (path, query_params) = Self::parse_path_and_query(target);

        Self {
            method,
            path,
            query_params,
            headers: HashMap::new(),
            host: None,
            scheme: "http".to_string(),
            remote_addr: None,
        }
    }

    /// Add a header; the name is lowercased
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.trim().to_string());
        self
    }

    /// Set the request host explicitly, taking precedence over the `Host` header
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.trim().to_string());
        self
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.trim().to_lowercase();
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Split the request target into its path and decoded query parameters
    fn parse_path_and_query(target: &str) -> (String, QueryParams) {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let mut query_params = HashMap::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|pair| !pair.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                query_params.insert(Self::decode_component(key), Self::decode_component(value));
            }
        }

        let path = if path.is_empty() { "/".to_string() } else { path.to_string() };
        (path, query_params)
    }

    fn decode_component(value: &str) -> String {
        let value = value.replace('+', " ");
        let decoded = urlencoding::decode(&value).map(|decoded| decoded.into_owned());
        decoded.unwrap_or(value)
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    /// Request path without the query string
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Host the request was addressed to: explicit host, else the `Host` header, else empty
    pub fn host(&self) -> &str {
        self.host.as_deref().or_else(|| self.header("host")).unwrap_or("")
    }

    /// Lowercased scheme, `http` unless set otherwise
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Client IP
    ///
    /// `X-Forwarded-For` and `X-Real-IP` are only honoured when the socket peer
    /// is a loopback or private IPv4 proxy; otherwise the peer address is used.
    pub fn client_ip(&self) -> Option<IpAddr> {
        let peer = self.remote_addr.map(|addr| addr.ip())?;
        if !is_trusted_proxy(&peer) {
            return Some(peer);
        }
        if let Some(forwarded) = self.header("x-forwarded-for") {
            if let Some(first) = forwarded.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
        if let Some(real_ip) = self.header("x-real-ip") {
            if let Ok(ip) = real_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
        Some(peer)
    }
}

fn is_trusted_proxy(ip: &IpAddr) -> bool {
    ip.is_loopback()
        || match ip {
            IpAddr::V4(v4) => v4.is_private(),
            IpAddr::V6(_) => false,
        }
}
