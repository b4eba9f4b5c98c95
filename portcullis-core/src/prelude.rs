//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use portcullis_core::prelude::*;
//! ```

// === Configuration ===
pub use crate::config::{LoggingConfig, PortcullisConfig, SecuritySettings};
pub use crate::logging::init_logging;

// === HTTP types ===
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse, StatusCode};

// === Routing ===
pub use crate::routing::{PathParams, RouteMatch, RouteOptions, Router, UrlGenerator};

// === Security ===
pub use crate::security::{
    AccessControl, AccessControlRule, AccessDecisionManager, DecisionStrategy,
    FirewallDefinition, FirewallRegistry, GlobalSecurity, RoleHierarchy, SecurityBuilder,
    SecurityContext, Token,
};

// === Kernel and events ===
pub use crate::events::{EventSink, LogEventSink};
pub use crate::kernel::{Dispatch, Kernel};

// === Errors ===
pub use crate::{Error, Result};
