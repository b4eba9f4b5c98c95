//! HTTP response building

use std::collections::HashMap;

use super::constants::{content_types, headers};
use super::{HttpError, HttpResult};

/// HTTP status codes produced by the routing and security layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    // 2xx Success
    Ok = 200,
    Created = 201,
    NoContent = 204,

    // 3xx Redirection
    Found = 302,

    // 4xx Client Error
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,

    // 5xx Server Error
    InternalServerError = 500,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn reason_phrase(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::Found => "Found",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

/// A response produced by a handler, an entry point or the kernel itself
///
/// ```rust,ignore
/// use portcullis_core::http::HttpResponse;
///
/// let response = HttpResponse::ok().json(r#"{"status":"up"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: HashMap::new(), body: Vec::new() }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::Ok)
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NoContent)
    }

    /// Temporary redirect to another URL
    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::Found).header(headers::LOCATION, location)
    }

    /// Set a header; names are matched case-insensitively on lookup
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn content_type(self, content_type: &str) -> Self {
        self.header(headers::CONTENT_TYPE, content_type)
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.headers.insert(headers::CONTENT_LENGTH.to_string(), body.len().to_string());
        self.body = body;
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.content_type(content_types::TEXT).body(text.as_bytes().to_vec())
    }

    pub fn json(self, json: &str) -> Self {
        self.content_type(content_types::JSON).body(json.as_bytes().to_vec())
    }

    pub fn json_value(self, value: &serde_json::Value) -> Self {
        self.json(&value.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn body_string(&self) -> HttpResult<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| HttpError::InvalidRequest(format!("Body is not valid UTF-8: {}", e)))
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::MethodNotAllowed.to_string(), "405 Method Not Allowed");
    }

    #[test]
    fn test_text_response() {
        let response = HttpResponse::ok().text("Hello");

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.body_string().unwrap(), "Hello");
        assert_eq!(response.header_value("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(response.header_value("Content-Length"), Some("5"));
    }

    #[test]
    fn test_redirect() {
        let response = HttpResponse::redirect("/login");
        assert_eq!(response.status(), StatusCode::Found);
        assert_eq!(response.header_value("location"), Some("/login"));
    }
}
