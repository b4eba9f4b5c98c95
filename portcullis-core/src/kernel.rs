//! Request lifecycle: security resolution, access control, then routing
//!
//! [`Kernel::handle`] turns a request into a response and publishes
//! `kernel.request`, `kernel.response` and, when security or routing fails,
//! `kernel.exception` to the configured [`EventSink`].

use std::sync::Arc;

use crate::events::{Event, EventSink};
use crate::http::{json_error, method_not_allowed, HttpRequest, HttpResponse, StatusCode};
use crate::routing::{MatchedRoute, RouteMatch, Router};
use crate::security::{
    AccessControlListener, Authorization, FirewallRegistry, Resolution, SecurityContext,
    SecurityError, SecurityResolutionListener,
};

/// What the kernel decided to do with a request
#[derive(Debug)]
pub enum Dispatch {
    /// Run this route's handler; the security context is present when a firewall matched
    Handler { route: MatchedRoute, security_context: Option<SecurityContext> },
    /// Answer directly (security short-circuit, 404, 405)
    Response(HttpResponse),
}

struct SecurityLayer {
    resolution: SecurityResolutionListener,
    access_control: AccessControlListener,
}

pub struct Kernel {
    router: Arc<Router>,
    events: Arc<dyn EventSink>,
    security: Option<SecurityLayer>,
}

impl Kernel {
    pub fn new(router: Router, events: Arc<dyn EventSink>) -> Self {
        Self { router: Arc::new(router), events, security: None }
    }

    /// Put the firewalls of `registry` in front of the router
    pub fn with_security(self, registry: FirewallRegistry) -> Self {
        self.with_security_listener(registry, |listener| listener)
    }

    /// Like [`Kernel::with_security`], customizing the access-control listener
    pub fn with_security_listener<F>(mut self, registry: FirewallRegistry, configure: F) -> Self
    where
        F: FnOnce(AccessControlListener) -> AccessControlListener,
    {
        let registry = Arc::new(registry);
        let access_control =
            configure(AccessControlListener::new(Arc::clone(&registry), Arc::clone(&self.events)));
        self.security = Some(SecurityLayer {
            resolution: SecurityResolutionListener::new(registry, Arc::clone(&self.events)),
            access_control,
        });
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn is_secured(&self) -> bool {
        self.security.is_some()
    }

    /// Run security and routing without invoking the handler
    pub fn dispatch(&self, request: &HttpRequest) -> Dispatch {
        self.events.dispatch(&Event::KernelRequest {
            method: request.method().to_string(),
            path: request.path().to_string(),
        });

        let mut security_context = None;
        if let Some(security) = &self.security {
            security_context = match security.resolution.resolve(request) {
                Resolution::Unsecured => None,
                Resolution::Resolved(context) => Some(context),
                Resolution::Rejected { error, .. } => {
                    return Dispatch::Response(self.exception(request, &error));
                }
            };
            match security.access_control.authorize(request, security_context.as_mut()) {
                Authorization::NotRequired | Authorization::Granted { .. } => {}
                Authorization::Respond(response) => return Dispatch::Response(response),
                Authorization::Denied(error) => {
                    return Dispatch::Response(self.exception(request, &error));
                }
            }
        }

        match self.router.match_request(request) {
            RouteMatch::Found(route) => Dispatch::Handler { route, security_context },
            RouteMatch::MethodNotAllowed { allowed, .. } => {
                log::debug!("{} {} not allowed, expected one of {:?}", request.method(), request.path(), allowed);
                Dispatch::Response(method_not_allowed(&allowed))
            }
            RouteMatch::NotFound => Dispatch::Response(json_error(
                StatusCode::NotFound,
                "not_found",
                &format!("no route for {} {}", request.method(), request.path()),
            )),
        }
    }

    /// Dispatch the request and run the matched handler
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let response = match self.dispatch(request) {
            Dispatch::Handler { route, .. } => route.call(request),
            Dispatch::Response(response) => response,
        };
        self.events.dispatch(&Event::KernelResponse {
            path: request.path().to_string(),
            status: response.status().as_u16(),
        });
        response
    }

    fn exception(&self, request: &HttpRequest, error: &SecurityError) -> HttpResponse {
        let status = error.status_code();
        self.events.dispatch(&Event::KernelException {
            path: request.path().to_string(),
            status: status.as_u16(),
            message: error.to_string(),
        });
        // Denials carry no detail beyond the code; the event has the full error
        let message = match error {
            SecurityError::Forbidden | SecurityError::RuleRejected(_) => "access denied",
            SecurityError::Unauthorized { .. } => "authentication required",
            SecurityError::TokenResolution(_) => "authentication failed",
            SecurityError::InvalidConfiguration(_) | SecurityError::InvalidRegex { .. } => {
                "security is misconfigured"
            }
        };
        json_error(status, error.code(), message)
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("router", &self.router)
            .field("secured", &self.security.is_some())
            .finish()
    }
}
