//! Request-time security: firewall resolution and access control
//!
//! The kernel runs [`SecurityResolutionListener`] before routing and
//! [`AccessControlListener`] right after it, threading the resulting
//! [`SecurityContext`] through both.

use std::any::Any;
use std::sync::Arc;

use super::context::{MatchedAccessControlRule, SecurityContext, Source};
use super::error::SecurityError;
use super::firewall::FirewallRegistry;
use super::token::Token;
use crate::events::{AuthorizationEvent, Event, EventSink};
use crate::http::{json_error, HttpRequest, HttpResponse, StatusCode};

/// Attribute that grants access without authentication
pub const PUBLIC_ACCESS: &str = "PUBLIC_ACCESS";

/// Outcome of resolving the firewall and token of a request
#[derive(Debug)]
pub enum Resolution {
    /// No firewall covers the request
    Unsecured,
    Resolved(SecurityContext),
    /// A firewall matched but refused the request; the context carries an anonymous token
    Rejected { context: SecurityContext, error: SecurityError },
}

pub struct SecurityResolutionListener {
    registry: Arc<FirewallRegistry>,
    events: Arc<dyn EventSink>,
}

impl SecurityResolutionListener {
    pub fn new(registry: Arc<FirewallRegistry>, events: Arc<dyn EventSink>) -> Self {
        Self { registry, events }
    }

    pub fn resolve(&self, request: &HttpRequest) -> Resolution {
        let Some(firewall) = self.registry.match_request(request) else {
            return Resolution::Unsecured;
        };

        if let Err(error) = firewall.check(request) {
            return Resolution::Rejected {
                context: SecurityContext::new(firewall, Token::anonymous()),
                error,
            };
        }

        let source = firewall.token_source();
        let resolved = source.resolve(self.events.as_ref(), request);

        match resolved {
            Ok(token) => {
                let token = token.unwrap_or_else(Token::anonymous);
                log::debug!(
                    "Firewall '{}' resolved user '{}' for {}",
                    firewall.name(),
                    token.user_identifier(),
                    request.path()
                );
                Resolution::Resolved(SecurityContext::new(firewall, token))
            }
            Err(error) => {
                log::error!(
                    "Token source '{}' of firewall '{}' failed: {}",
                    source.name(),
                    firewall.name(),
                    error
                );
                Resolution::Rejected {
                    context: SecurityContext::new(firewall, Token::anonymous()),
                    error,
                }
            }
        }
    }
}

/// Outcome of the access-control check
#[derive(Debug)]
pub enum Authorization {
    /// No rule governs the request
    NotRequired,
    Granted { attributes: Vec<String> },
    /// Short-circuit with this response (entry point, denied handler, 401)
    Respond(HttpResponse),
    Denied(SecurityError),
}

pub struct AccessControlListener {
    registry: Arc<FirewallRegistry>,
    events: Arc<dyn EventSink>,
    public_attribute: String,
}

impl AccessControlListener {
    pub fn new(registry: Arc<FirewallRegistry>, events: Arc<dyn EventSink>) -> Self {
        Self { registry, events, public_attribute: PUBLIC_ACCESS.to_string() }
    }

    pub fn with_public_attribute(mut self, attribute: &str) -> Self {
        self.public_attribute = attribute.to_string();
        self
    }

    pub fn public_attribute(&self) -> &str {
        &self.public_attribute
    }

    /// Check the request against the firewall's access control, or the
    /// global one when no firewall covers it
    pub fn authorize(
        &self,
        request: &HttpRequest,
        context: Option<&mut SecurityContext>,
    ) -> Authorization {
        let firewall = context.as_ref().map(|ctx| Arc::clone(ctx.firewall()));
        let (access_control, source) = match &firewall {
            Some(firewall) => (Some(firewall.access_control()), firewall.sources().access_control),
            None => (self.registry.global_access_control(), Source::Global),
        };
        let Some(matched) = access_control.and_then(|ac| ac.match_path(request.path())) else {
            return Authorization::NotRequired;
        };

        let rule = MatchedAccessControlRule {
            firewall: firewall.as_ref().map(|fw| fw.name().to_string()),
            kind: matched.kind,
            path_prefix: matched.path_prefix.clone(),
            attributes: matched.attributes.clone(),
            rule_index: matched.rule_index,
            source,
        };
        let attributes = matched.attributes;

        let Some(context) = context else {
            if attributes.iter().any(|a| *a == self.public_attribute) {
                self.granted(request, None, &attributes, rule);
                return Authorization::Granted { attributes };
            }
            let error = SecurityError::unauthorized("no security context");
            self.denied(request, None, &attributes, rule, &error);
            return Authorization::Respond(json_error(
                StatusCode::Unauthorized,
                error.code(),
                &error.to_string(),
            ));
        };
        context.set_matched_rule(rule.clone());

        if attributes.iter().any(|a| *a == self.public_attribute) {
            self.granted(request, Some(context.token()), &attributes, rule);
            return Authorization::Granted { attributes };
        }

        let firewall = Arc::clone(context.firewall());
        let token = context.token();

        if !token.is_authenticated() {
            let error = SecurityError::unauthorized("full authentication is required");
            self.denied(request, Some(token), &attributes, rule, &error);
            return match firewall.entry_point() {
                Some(entry_point) => match entry_point.start(request, &error) {
                    Ok(response) => Authorization::Respond(response),
                    Err(err) => Authorization::Denied(err),
                },
                None => Authorization::Respond(json_error(
                    StatusCode::Unauthorized,
                    error.code(),
                    &error.to_string(),
                )),
            };
        }

        let Some(manager) = firewall.access_decision_manager() else {
            let error = SecurityError::InvalidConfiguration(format!(
                "firewall '{}' has access rules but no access decision manager",
                firewall.name()
            ));
            self.denied(request, Some(token), &attributes, rule, &error);
            return Authorization::Denied(error);
        };

        let subject: &dyn Any = request;
        match manager.decide_all(token, &attributes, Some(subject)) {
            Ok(()) => {
                self.granted(request, Some(token), &attributes, rule);
                Authorization::Granted { attributes }
            }
            Err(error) => {
                let outcome = match firewall.access_denied_handler() {
                    Some(handler) => match handler.handle(request, &error) {
                        Ok(Some(response)) => Authorization::Respond(response),
                        Ok(None) => Authorization::Denied(SecurityError::InvalidConfiguration(
                            format!(
                                "access denied handler of firewall '{}' returned no response",
                                firewall.name()
                            ),
                        )),
                        Err(err) => Authorization::Denied(err),
                    },
                    None => Authorization::Denied(error.clone()),
                };
                self.denied(request, Some(token), &attributes, rule, &error);
                outcome
            }
        }
    }

    fn granted(
        &self,
        request: &HttpRequest,
        token: Option<&Token>,
        attributes: &[String],
        rule: MatchedAccessControlRule,
    ) {
        let event = authorization_event(request, token, attributes, rule, None);
        self.events.dispatch(&Event::AuthorizationGranted(event));
    }

    fn denied(
        &self,
        request: &HttpRequest,
        token: Option<&Token>,
        attributes: &[String],
        rule: MatchedAccessControlRule,
        error: &SecurityError,
    ) {
        let event = authorization_event(request, token, attributes, rule, Some(error.to_string()));
        self.events.dispatch(&Event::AuthorizationDenied(event));
    }
}

fn authorization_event(
    request: &HttpRequest,
    token: Option<&Token>,
    attributes: &[String],
    rule: MatchedAccessControlRule,
    reason: Option<String>,
) -> AuthorizationEvent {
    AuthorizationEvent {
        firewall: rule.firewall.clone(),
        path: request.path().to_string(),
        user_identifier: token.map(|t| t.user_identifier().to_string()).unwrap_or_default(),
        attributes: attributes.to_vec(),
        matched_rule: Some(rule),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemoryEventSink, AUTHORIZATION_DENIED, AUTHORIZATION_GRANTED};
    use crate::http::HttpMethod;
    use crate::security::access_control::{AccessControl, AccessControlRule};
    use crate::security::builder::{FirewallDefinition, GlobalSecurity, SecurityBuilder};
    use crate::security::contract::{AccessDeniedHandler, ChallengeEntryPoint};
    use crate::security::decision::{AccessDecisionManager, DecisionStrategy};
    use crate::security::error::SecurityResult;
    use crate::security::matcher::PathPrefixMatcher;
    use crate::security::rule::ApiKeyHeaderRule;
    use crate::security::token_source::ResolverTokenSource;
    use crate::security::voter::{RoleVoter, Voter};

    struct SilentHandler;

    impl AccessDeniedHandler for SilentHandler {
        fn handle(
            &self,
            _request: &HttpRequest,
            _error: &SecurityError,
        ) -> SecurityResult<Option<HttpResponse>> {
            Ok(None)
        }
    }

    fn user_from_header(request: &HttpRequest) -> SecurityResult<Option<Token>> {
        match request.header("x-user") {
            Some("boom") => Err(SecurityError::TokenResolution("bad credentials".to_string())),
            Some(user) => Ok(Some(Token::authenticated(user, ["ROLE_USER"]))),
            None => Ok(None),
        }
    }

    fn registry(global: GlobalSecurity, api: FirewallDefinition) -> Arc<FirewallRegistry> {
        let config = SecurityBuilder::new().with_global(global).with_firewall(api).compile().unwrap();
        Arc::new(FirewallRegistry::new(config))
    }

    fn api_firewall() -> FirewallDefinition {
        FirewallDefinition::new(
            "api",
            Arc::new(PathPrefixMatcher::new("/api")),
            Arc::new(ResolverTokenSource::new("header", user_from_header)),
        )
        .stateless()
    }

    fn global() -> GlobalSecurity {
        GlobalSecurity::new()
            .with_access_control(AccessControl::new(vec![
                AccessControlRule::prefix("/api/public", [PUBLIC_ACCESS]),
                AccessControlRule::prefix("/api/admin", ["ROLE_ADMIN"]),
                AccessControlRule::prefix("/api", ["ROLE_USER"]),
                AccessControlRule::prefix("/open", ["ROLE_USER"]),
            ]))
            .with_access_decision_manager(AccessDecisionManager::new(
                DecisionStrategy::Affirmative,
                vec![Arc::new(RoleVoter::new()) as Arc<dyn Voter>],
            ))
    }

    fn run(
        registry: &Arc<FirewallRegistry>,
        events: &Arc<MemoryEventSink>,
        request: &HttpRequest,
    ) -> (Resolution, Authorization) {
        let sink: Arc<dyn EventSink> = events.clone();
        let resolution = SecurityResolutionListener::new(registry.clone(), sink.clone()).resolve(request);
        let listener = AccessControlListener::new(registry.clone(), sink);
        let mut resolution = resolution;
        let authorization = match &mut resolution {
            Resolution::Resolved(context) => listener.authorize(request, Some(context)),
            _ => listener.authorize(request, None),
        };
        (resolution, authorization)
    }

    #[test]
    fn test_unsecured_path_uses_global_rules() {
        let registry = registry(global(), api_firewall());
        let events = Arc::new(MemoryEventSink::new());

        let request = HttpRequest::new(HttpMethod::GET, "/elsewhere");
        let (resolution, authorization) = run(&registry, &events, &request);
        assert!(matches!(resolution, Resolution::Unsecured));
        assert!(matches!(authorization, Authorization::NotRequired));

        let request = HttpRequest::new(HttpMethod::GET, "/open/page");
        let (_, authorization) = run(&registry, &events, &request);
        match authorization {
            Authorization::Respond(response) => assert_eq!(response.status(), StatusCode::Unauthorized),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(events.names(), vec![AUTHORIZATION_DENIED]);
    }

    #[test]
    fn test_public_and_granted() {
        let registry = registry(global(), api_firewall());
        let events = Arc::new(MemoryEventSink::new());

        let request = HttpRequest::new(HttpMethod::GET, "/api/public/docs");
        let (resolution, authorization) = run(&registry, &events, &request);
        assert!(matches!(authorization, Authorization::Granted { .. }));
        match resolution {
            Resolution::Resolved(context) => {
                assert!(!context.token().is_authenticated());
                let rule = context.matched_rule().unwrap();
                assert_eq!(rule.path_prefix, "/api/public");
                assert_eq!(rule.firewall.as_deref(), Some("api"));
                assert_eq!(rule.source, Source::Merged);
            }
            other => panic!("unexpected {:?}", other),
        }

        let request = HttpRequest::new(HttpMethod::GET, "/api/items").with_header("X-User", "alice");
        let (_, authorization) = run(&registry, &events, &request);
        assert!(matches!(authorization, Authorization::Granted { .. }));
        assert_eq!(events.names(), vec![AUTHORIZATION_GRANTED, AUTHORIZATION_GRANTED]);
    }

    #[test]
    fn test_forbidden_and_unauthenticated() {
        let registry = registry(
            global().with_entry_point(Arc::new(ChallengeEntryPoint::new("Bearer"))),
            api_firewall(),
        );
        let events = Arc::new(MemoryEventSink::new());

        let request = HttpRequest::new(HttpMethod::GET, "/api/admin/users").with_header("X-User", "alice");
        let (_, authorization) = run(&registry, &events, &request);
        assert!(matches!(authorization, Authorization::Denied(SecurityError::Forbidden)));

        let request = HttpRequest::new(HttpMethod::GET, "/api/items");
        let (_, authorization) = run(&registry, &events, &request);
        match authorization {
            Authorization::Respond(response) => {
                assert_eq!(response.status(), StatusCode::Unauthorized);
                assert_eq!(response.header_value("www-authenticate"), Some("Bearer"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(events.names(), vec![AUTHORIZATION_DENIED, AUTHORIZATION_DENIED]);
    }

    #[test]
    fn test_denied_handler_without_response_is_an_error() {
        let registry =
            registry(global().with_access_denied_handler(Arc::new(SilentHandler)), api_firewall());
        let events = Arc::new(MemoryEventSink::new());

        let request = HttpRequest::new(HttpMethod::GET, "/api/admin").with_header("X-User", "alice");
        let (_, authorization) = run(&registry, &events, &request);
        match authorization {
            Authorization::Denied(err) => {
                assert!(matches!(err, SecurityError::InvalidConfiguration(_)))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_token_source_failures_reject() {
        let registry = registry(global(), api_firewall());
        let events = Arc::new(MemoryEventSink::new());
        let listener = SecurityResolutionListener::new(registry, events);

        let request = HttpRequest::new(HttpMethod::GET, "/api/items").with_header("X-User", "boom");
        match listener.resolve(&request) {
            Resolution::Rejected { context, error } => {
                assert!(!context.token().is_authenticated());
                assert_eq!(error.status_code(), StatusCode::Unauthorized);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rule_rejection() {
        let rule = ApiKeyHeaderRule::new(Arc::new(PathPrefixMatcher::new("/api")), "x-api-key", "secret")
            .unwrap();
        let registry = registry(global(), api_firewall().with_rule(Arc::new(rule)));
        let listener = SecurityResolutionListener::new(registry, Arc::new(MemoryEventSink::new()));

        let request = HttpRequest::new(HttpMethod::GET, "/api/items");
        assert!(matches!(
            listener.resolve(&request),
            Resolution::Rejected { error: SecurityError::Forbidden, .. }
        ));
        let request = request.with_header("X-Api-Key", "secret");
        assert!(matches!(listener.resolve(&request), Resolution::Resolved(_)));
    }
}
