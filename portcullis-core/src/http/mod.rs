//! Transport-agnostic HTTP primitives
//!
//! Routing and authorization only need a view of the request and a way to
//! describe the response; binding these to a socket is left to the host
//! application.
//!
//! - [`request`] - request view (method, path, query, host, scheme, headers)
//! - [`response`] - fluent response builder
//! - [`error`] - uniform JSON error bodies

pub mod error;
pub mod request;
pub mod response;

pub use error::{json_error, method_not_allowed};
pub use request::{Headers, HttpMethod, HttpRequest, QueryParams};
pub use response::{HttpResponse, StatusCode};

/// Result type for HTTP operations
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// HTTP-specific error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// Invalid HTTP request format
    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),
    /// Unsupported HTTP method
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// Common header names and content types
pub mod constants {
    pub mod headers {
        pub const CONTENT_TYPE: &str = "Content-Type";
        pub const CONTENT_LENGTH: &str = "Content-Length";
        pub const LOCATION: &str = "Location";
        pub const ALLOW: &str = "Allow";
        pub const WWW_AUTHENTICATE: &str = "WWW-Authenticate";
    }

    pub mod content_types {
        pub const JSON: &str = "application/json";
        pub const TEXT: &str = "text/plain; charset=utf-8";
    }
}
