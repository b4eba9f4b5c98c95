//! End-to-end authorization: firewalls, access control and decision strategies

use std::sync::Arc;

use portcullis_core::events::{
    Event, MemoryEventSink, AUTHORIZATION_DENIED, AUTHORIZATION_GRANTED, KERNEL_EXCEPTION,
    LOGIN_SUCCESS,
};
use portcullis_core::http::{HttpMethod, HttpRequest, HttpResponse, StatusCode};
use portcullis_core::kernel::{Dispatch, Kernel};
use portcullis_core::routing::Router;
use portcullis_core::security::{
    AccessControl, AccessControlRule, AccessDecisionManager, AccessDeniedHandler,
    ApiKeyHeaderAuthenticator, Authenticator, AuthenticatorManager, AuthenticatorTokenSource, DecisionStrategy,
    FirewallDefinition, FirewallManager, FirewallOverride, FirewallRegistry, GlobalSecurity, IpAccessRule, LoginHandler,
    LoginRedirectEntryPoint, LoginResult, LogoutHandler, PathPrefixMatcher, ResolverTokenSource,
    RoleHierarchy, RoleVoter, SecurityBuilder, SecurityError, SecurityResult, Subject, Token,
    VoteResult, Voter, PUBLIC_ACCESS,
};

fn ok(_: &HttpRequest, _: &portcullis_core::routing::PathParams) -> HttpResponse {
    HttpResponse::ok().text("ok")
}

struct FormLogin;

impl LoginHandler for FormLogin {
    fn login(&self, request: &HttpRequest) -> SecurityResult<LoginResult> {
        match request.query_param("user") {
            Some(user) => Ok(LoginResult {
                token: Token::authenticated(user, ["ROLE_USER"]),
                response: HttpResponse::redirect("/app"),
            }),
            None => Err(SecurityError::unauthorized("missing user")),
        }
    }
}

impl LogoutHandler for FormLogin {
    fn logout(&self, _request: &HttpRequest, _token: &Token) -> SecurityResult<HttpResponse> {
        Ok(HttpResponse::redirect("/"))
    }
}

struct SilentDeniedHandler;

impl AccessDeniedHandler for SilentDeniedHandler {
    fn handle(&self, _: &HttpRequest, _: &SecurityError) -> SecurityResult<Option<HttpResponse>> {
        Ok(None)
    }
}

/// Votes a fixed result on every attribute starting with `VOTE_`
struct FixedVoter(VoteResult);

impl Voter for FixedVoter {
    fn supports(&self, attribute: &str, _subject: Subject<'_>) -> bool {
        attribute.starts_with("VOTE_")
    }

    fn vote(&self, _token: &Token, _attribute: &str, _subject: Subject<'_>) -> VoteResult {
        self.0
    }
}

fn manager(strategy: DecisionStrategy, votes: &[VoteResult]) -> AccessDecisionManager {
    let voters = votes.iter().map(|v| Arc::new(FixedVoter(*v)) as Arc<dyn Voter>).collect();
    AccessDecisionManager::new(strategy, voters)
}

fn router() -> Router {
    let mut router = Router::new();
    for path in ["/", "/api/items", "/api/admin/stats", "/api/public/status", "/app", "/app/admin"] {
        router.get(path, ok).unwrap();
    }
    router
}

fn api_token_source() -> Arc<AuthenticatorTokenSource> {
    let admin = ApiKeyHeaderAuthenticator::new("x-api-key", "admin-key", "admin", ["ROLE_ADMIN"]).unwrap();
    Arc::new(AuthenticatorTokenSource::new(AuthenticatorManager::new(vec![Arc::new(admin) as Arc<dyn Authenticator>])))
}

fn app_kernel(events: Arc<MemoryEventSink>) -> Kernel {
    let global = GlobalSecurity::new()
        .with_access_control(AccessControl::new(vec![
            AccessControlRule::prefix("/api/public", [PUBLIC_ACCESS]),
            AccessControlRule::prefix("/api", ["ROLE_USER"]),
            AccessControlRule::prefix("/api/admin", ["ROLE_ADMIN"]),
            AccessControlRule::prefix("/app", ["ROLE_USER"]),
            AccessControlRule::exact("/app/admin", ["ROLE_ADMIN"]).unwrap(),
        ]))
        .with_role_hierarchy(RoleHierarchy::default().with_role("ROLE_ADMIN", ["ROLE_EDITOR", "ROLE_USER"]))
        .with_access_decision_manager(AccessDecisionManager::new(
            DecisionStrategy::Affirmative,
            vec![Arc::new(RoleVoter::with_prefix("ROLE_")) as Arc<dyn Voter>],
        ));

    let api = FirewallDefinition::new("api", Arc::new(PathPrefixMatcher::new("/api")), api_token_source())
        .stateless()
        .with_rule(Arc::new(
            IpAccessRule::new(Arc::new(PathPrefixMatcher::new("/api/admin")), &[] as &[&str], &["10.0.0.0/8"])
                .unwrap(),
        ));

    let web = FirewallDefinition::new(
        "web",
        Arc::new(PathPrefixMatcher::new("")),
        Arc::new(ResolverTokenSource::new("session", |request: &HttpRequest| {
            Ok(request.header("x-session-user").map(|user| Token::authenticated(user, ["ROLE_USER"])))
        })),
    )
    .with_login("/login", Arc::new(FormLogin))
    .with_logout("/logout", Arc::new(FormLogin))
    .with_override(
        FirewallOverride::new()
            .with_entry_point(Arc::new(LoginRedirectEntryPoint::new("/login")))
            .with_access_denied_handler(Arc::new(SilentDeniedHandler)),
    );

    let config = SecurityBuilder::new().with_global(global).with_firewall(api).with_firewall(web).compile().unwrap();
    Kernel::new(router(), events).with_security(FirewallRegistry::new(config))
}

fn get(path: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::GET, path)
}

#[test]
fn hierarchy_grants_implied_role_through_the_kernel() {
    let events = Arc::new(MemoryEventSink::new());
    let kernel = app_kernel(events.clone());

    let response = kernel.handle(&get("/api/items").with_header("X-Api-Key", "admin-key"));
    assert_eq!(response.status(), StatusCode::Ok);
    assert!(events.names().contains(&LOGIN_SUCCESS));
    assert!(events.names().contains(&AUTHORIZATION_GRANTED));

    let granted = events.events().into_iter().find_map(|event| match event {
        Event::AuthorizationGranted(auth) => Some(auth),
        _ => None,
    });
    let granted = granted.unwrap();
    assert_eq!(granted.user_identifier, "admin");
    assert_eq!(granted.firewall.as_deref(), Some("api"));
    assert_eq!(granted.attributes, vec!["ROLE_USER"]);
}

#[test]
fn longest_prefix_decides_required_attributes() {
    let events = Arc::new(MemoryEventSink::new());
    let kernel = app_kernel(events.clone());

    // /api/admin/stats falls under the longer /api/admin rule, not /api
    let response = kernel.handle(&get("/api/admin/stats").with_header("X-Api-Key", "admin-key"));
    assert_eq!(response.status(), StatusCode::Ok);

    let response = kernel.handle(&get("/api/admin/stats"));
    assert_eq!(response.status(), StatusCode::Unauthorized);
    assert!(events.names().contains(&AUTHORIZATION_DENIED));
}

#[test]
fn public_attribute_skips_authentication() {
    let events = Arc::new(MemoryEventSink::new());
    let kernel = app_kernel(events.clone());

    let response = kernel.handle(&get("/api/public/status"));
    assert_eq!(response.status(), StatusCode::Ok);
    assert_eq!(events.names().iter().filter(|n| **n == AUTHORIZATION_GRANTED).count(), 1);
}

#[test]
fn unauthenticated_request_uses_entry_point() {
    let kernel = app_kernel(Arc::new(MemoryEventSink::new()));

    let response = kernel.handle(&get("/app"));
    assert_eq!(response.status(), StatusCode::Found);
    assert_eq!(response.header_value("location"), Some("/login"));

    let response = kernel.handle(&get("/app").with_header("X-Session-User", "ada"));
    assert_eq!(response.status(), StatusCode::Ok);
}

#[test]
fn exact_rule_and_denied_handler_without_response() {
    let events = Arc::new(MemoryEventSink::new());
    let kernel = app_kernel(events.clone());

    // The exact rule requires ROLE_ADMIN; the handler declines to answer
    let response = kernel.handle(&get("/app/admin").with_header("X-Session-User", "ada"));
    assert_eq!(response.status(), StatusCode::InternalServerError);
    assert!(events.names().contains(&KERNEL_EXCEPTION));
    assert!(events.names().contains(&AUTHORIZATION_DENIED));
}

#[test]
fn pre_authentication_rule_rejects_before_token_resolution() {
    let events = Arc::new(MemoryEventSink::new());
    let kernel = app_kernel(events.clone());

    let request = get("/api/admin/stats")
        .with_remote_addr("127.0.0.1:8080".parse().unwrap())
        .with_header("X-Api-Key", "admin-key")
        .with_header("X-Forwarded-For", "10.1.2.3");
    let response = kernel.handle(&request);
    assert_eq!(response.status(), StatusCode::Forbidden);
    assert!(!events.names().contains(&LOGIN_SUCCESS));
}

#[test]
fn firewalls_are_selected_in_declaration_order() {
    let config = SecurityBuilder::new()
        .with_firewall(
            FirewallDefinition::new("first", Arc::new(PathPrefixMatcher::new("/")), api_token_source()).stateless(),
        )
        .with_firewall(
            FirewallDefinition::new("second", Arc::new(PathPrefixMatcher::new("/api")), api_token_source())
                .stateless(),
        )
        .compile()
        .unwrap();
    let manager = FirewallManager::new(&config);
    assert_eq!(manager.names(), vec!["first", "second"]);
    assert!(manager.firewall("").is_err());
    assert!(manager.firewall("third").is_err());

    let registry = FirewallRegistry::new(config);
    assert_eq!(registry.match_request(&get("/api/items")).unwrap().name(), "first");
}

#[test]
fn exact_rule_beats_regex_for_root() {
    let access_control = AccessControl::new(vec![
        AccessControlRule::regex("^/", ["ROLE_ANY"]).unwrap(),
        AccessControlRule::exact("/", [PUBLIC_ACCESS]).unwrap(),
    ]);
    assert_eq!(access_control.match_path("/").unwrap().attributes, vec![PUBLIC_ACCESS]);
    assert_eq!(access_control.match_path("/other").unwrap().attributes, vec!["ROLE_ANY"]);
}

#[test]
fn longer_prefix_rule_wins() {
    let access_control = AccessControl::new(vec![
        AccessControlRule::prefix("/admin", ["ROLE_ADMIN"]),
        AccessControlRule::prefix("/admin/settings", ["ROLE_SUPER_ADMIN"]),
    ]);
    let matched = access_control.match_path("/admin/settings/users").unwrap();
    assert_eq!(matched.attributes, vec!["ROLE_SUPER_ADMIN"]);
    assert_eq!(matched.rule_index, 1);
}

#[test]
fn decision_strategies() {
    use VoteResult::{Abstain, Denied, Granted};
    let token = Token::authenticated("u", Vec::<String>::new());

    assert!(manager(DecisionStrategy::Affirmative, &[Denied, Granted, Denied]).decide(&token, "VOTE_X", None));
    assert!(!manager(DecisionStrategy::Consensus, &[Granted, Denied]).decide(&token, "VOTE_X", None));
    assert!(manager(DecisionStrategy::Consensus, &[Granted, Granted, Denied]).decide(&token, "VOTE_X", None));
    assert!(!manager(DecisionStrategy::Unanimous, &[Granted, Granted, Denied]).decide(&token, "VOTE_X", None));
    assert!(manager(DecisionStrategy::Unanimous, &[Granted, Abstain]).decide(&token, "VOTE_X", None));
    assert!(!manager(DecisionStrategy::Affirmative, &[Abstain, Abstain]).decide(&token, "VOTE_X", None));
}

#[test]
fn attribute_without_supporting_voter_is_denied() {
    let token = Token::authenticated("u", ["ROLE_USER"]);
    for strategy in [DecisionStrategy::Affirmative, DecisionStrategy::Consensus, DecisionStrategy::Unanimous] {
        let decider = manager(strategy, &[VoteResult::Granted]);
        assert!(!decider.decide(&token, "UNSUPPORTED", None));
        assert_eq!(decider.decide_all(&token, &["UNSUPPORTED"], None), Err(SecurityError::Forbidden));
    }
    let empty = AccessDecisionManager::new(DecisionStrategy::Affirmative, Vec::new());
    assert!(!empty.decide(&token, "ROLE_USER", None));
}

#[test]
fn failing_token_source_answers_unauthorized() {
    let config = SecurityBuilder::new()
        .with_firewall(
            FirewallDefinition::new(
                "broken",
                Arc::new(PathPrefixMatcher::new("")),
                Arc::new(ResolverTokenSource::new("broken", |_: &HttpRequest| {
                    Err(SecurityError::TokenResolution("upstream unavailable".to_string()))
                })),
            )
            .stateless(),
        )
        .compile()
        .unwrap();
    let events = Arc::new(MemoryEventSink::new());
    let kernel = Kernel::new(router(), events.clone()).with_security(FirewallRegistry::new(config));

    let response = kernel.handle(&get("/"));
    assert_eq!(response.status(), StatusCode::Unauthorized);
    let body: serde_json::Value = serde_json::from_slice(response.body_bytes()).unwrap();
    assert_eq!(body["error"], "authentication_failed");
    assert_eq!(body["message"], "authentication failed");
    assert!(!String::from_utf8_lossy(response.body_bytes()).contains("upstream unavailable"));
    let logged = events.events().into_iter().any(|event| match event {
        Event::KernelException { message, .. } => message.contains("upstream unavailable"),
        _ => false,
    });
    assert!(logged);
}

#[test]
fn security_context_checks_roles_through_the_hierarchy() {
    let kernel = app_kernel(Arc::new(MemoryEventSink::new()));

    let request = get("/api/items").with_header("X-Api-Key", "admin-key");
    match kernel.dispatch(&request) {
        Dispatch::Handler { security_context: Some(context), .. } => {
            assert_eq!(context.firewall_name(), "api");
            assert!(context.is_granted("ROLE_ADMIN"));
            assert!(context.is_granted("ROLE_EDITOR"));
            assert!(!context.is_granted("ROLE_SUPER_ADMIN"));
            assert!(!context.is_granted(""));
            let rule = context.matched_rule().unwrap();
            assert_eq!(rule.path_prefix, "/api");
            assert_eq!(rule.attributes, vec!["ROLE_USER"]);
        }
        other => panic!("unexpected {:?}", other),
    }
}
