//! Trie-based routing and reverse routing
//!
//! # Architecture
//!
//! - [`pattern`] - pattern syntax and path normalization
//! - [`trie`] - segment trie producing candidate routes
//! - [`route`] - route definitions and declaration options
//! - [`registry`] - ordered definitions, name index and trie
//! - [`router`] - registration and request matching
//! - [`group`] - shared prefixes, name prefixes, defaults and requirements
//! - [`url_generator`] - paths and URLs from route names

pub mod error;
pub mod group;
pub mod pattern;
pub mod registry;
pub mod route;
pub mod router;
pub mod trie;
pub mod url_generator;

pub use error::{RoutingError, RoutingResult};
pub use group::RouteGroup;
pub use pattern::{join_paths, normalize_path, Segment};
pub use registry::RouteRegistry;
pub use route::{
    Handler, PathParams, RouteAttributes, RouteDefinition, RouteOptions, ATTR_HOST, ATTR_LOCALES,
    ATTR_METHODS, ATTR_PATTERN, ATTR_ROUTE, ATTR_SCHEMES, LOCALE_PARAM,
};
pub use router::{MatchedRoute, RouteMatch, Router};
pub use url_generator::UrlGenerator;
