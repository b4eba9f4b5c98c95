use crate::http::StatusCode;

/// Errors raised by the firewall, voters and access-control layers
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SecurityError {
    #[error("access denied")]
    Forbidden,

    #[error("authentication required: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid security configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid access control regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("token resolution failed: {0}")]
    TokenResolution(String),

    #[error("request rejected: {0}")]
    RuleRejected(String),
}

impl SecurityError {
    pub fn unauthorized(reason: &str) -> Self {
        SecurityError::Unauthorized { reason: reason.to_string() }
    }

    /// Status used when the error surfaces as a response
    pub fn status_code(&self) -> StatusCode {
        match self {
            SecurityError::Forbidden | SecurityError::RuleRejected(_) => StatusCode::Forbidden,
            SecurityError::Unauthorized { .. } | SecurityError::TokenResolution(_) => {
                StatusCode::Unauthorized
            }
            SecurityError::InvalidConfiguration(_) | SecurityError::InvalidRegex { .. } => {
                StatusCode::InternalServerError
            }
        }
    }

    /// Snake-case code used in JSON error bodies
    pub fn code(&self) -> &'static str {
        match self {
            SecurityError::Forbidden => "forbidden",
            SecurityError::Unauthorized { .. } => "unauthorized",
            SecurityError::InvalidConfiguration(_) | SecurityError::InvalidRegex { .. } => {
                "security_misconfigured"
            }
            SecurityError::TokenResolution(_) => "authentication_failed",
            SecurityError::RuleRejected(_) => "request_rejected",
        }
    }
}

pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
