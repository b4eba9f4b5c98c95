//! Portcullis - Core
//!
//! Request routing and authorization for Rust web services.
//!
//! # Overview
//!
//! Portcullis sits between a connection layer and application handlers. A
//! trie-backed [`Router`](routing::Router) maps method, host, scheme and
//! path to a handler and its path parameters, and generates paths and URLs
//! back from route names. In front of it, firewalls select the security
//! policy of each request, resolve the caller's token and check path-based
//! access control through pluggable voters.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use portcullis_core::prelude::*;
//! use std::sync::Arc;
//!
//! let mut router = Router::new();
//! router.handle_named("post_show", HttpMethod::GET, "/posts/:id", |_, params| {
//!     HttpResponse::ok().text(&params["id"])
//! })?;
//!
//! let security = SecurityBuilder::new()
//!     .with_global(config.security.global_security()?)
//!     .with_firewall(FirewallDefinition::new("api", matcher, token_source).stateless())
//!     .compile()?;
//!
//! let kernel = Kernel::new(router, Arc::new(LogEventSink))
//!     .with_security(FirewallRegistry::new(security));
//! let response = kernel.handle(&HttpRequest::new(HttpMethod::GET, "/posts/42"));
//! ```
//!
//! # Architecture
//!
//! - [`http`] - transport-agnostic request and response types
//! - [`routing`] - route registration, matching and URL generation
//! - [`security`] - firewalls, access control, role hierarchy and voters
//! - [`events`] - kernel and security events and their sinks
//! - [`kernel`] - request lifecycle tying security and routing together
//! - [`config`] - TOML and environment configuration
//! - [`logging`] - `env_logger` initialisation

pub mod config; // Configuration system with TOML support
pub mod events;
pub mod http;
pub mod kernel;
pub mod logging;
pub mod routing;
pub mod security;

// Prelude module for convenient imports
pub mod prelude;

// Re-exports of main types
pub use config::PortcullisConfig;
pub use kernel::{Dispatch, Kernel};
pub use routing::{Router, RoutingError};
pub use security::SecurityError;

// Main result type for the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Portcullis
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Route registration or URL generation errors
    #[error("Routing Error: {0}")]
    Routing(#[from] RoutingError),
    /// Security configuration or authorization errors
    #[error("Security Error: {0}")]
    Security(#[from] SecurityError),
    /// Configuration loading and validation errors
    #[error("Configuration Error: {0:#}")]
    Config(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: Error = RoutingError::RouteNotFound("home".to_string()).into();
        assert!(matches!(err, Error::Routing(_)));
        assert!(err.to_string().starts_with("Routing Error"));

        let err: Error = SecurityError::Forbidden.into();
        assert_eq!(err.to_string(), "Security Error: access denied");

        let err: Error = anyhow::anyhow!("bad file").into();
        assert!(matches!(err, Error::Config(_)));
    }
}
