//! Request router: registration and matching
//!
//! Matching walks the segment trie for candidates and verifies each one in
//! registration order against method, host, scheme, path requirements and
//! locale. The highest priority survivor wins, earliest registration first on
//! ties. When only the method disqualified every candidate the result is a
//! method-not-allowed carrying the sorted set of acceptable methods.

use std::sync::Arc;

use serde_json::Value;

use super::error::RoutingResult;
use super::group::RouteGroup;
use super::pattern::{normalize_path, split_segments};
use super::registry::RouteRegistry;
use super::route::{
    Handler, PathParams, RouteAttributes, RouteDefinition, RouteOptions, ATTR_METHODS,
};
use super::url_generator::UrlGenerator;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// A successful match
#[derive(Clone)]
pub struct MatchedRoute {
    pub handler: Handler,
    pub params: PathParams,
    pub attributes: RouteAttributes,
    pub route_index: usize,
}

impl MatchedRoute {
    pub fn route_name(&self) -> Option<&str> {
        self.attributes.get(super::route::ATTR_ROUTE).and_then(Value::as_str)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    pub fn call(&self, request: &HttpRequest) -> HttpResponse {
        (self.handler)(request, &self.params)
    }
}

impl std::fmt::Debug for MatchedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchedRoute")
            .field("params", &self.params)
            .field("attributes", &self.attributes)
            .field("route_index", &self.route_index)
            .finish_non_exhaustive()
    }
}

/// Outcome of matching a request against the registry
#[derive(Debug, Clone)]
pub enum RouteMatch {
    Found(MatchedRoute),
    /// The path matched but no route accepts the method; `allowed` is sorted
    MethodNotAllowed { allowed: Vec<HttpMethod>, attributes: RouteAttributes },
    NotFound,
}

impl RouteMatch {
    pub fn is_found(&self) -> bool {
        matches!(self, RouteMatch::Found(_))
    }

    pub fn found(self) -> Option<MatchedRoute> {
        match self {
            RouteMatch::Found(matched) => Some(matched),
            _ => None,
        }
    }
}

/// Trie-backed router
///
/// Registration takes `&mut self`; once built, a router is shared read-only
/// (for instance behind an `Arc`) and matched from any number of threads.
#[derive(Debug, Default)]
pub struct Router {
    registry: RouteRegistry,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route with full options, returning its registration index
    pub fn handle_with_options<F>(
        &mut self,
        pattern: &str,
        handler: F,
        options: RouteOptions,
    ) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.add_route(pattern, Arc::new(handler), options)
    }

    /// Register a route for a single method
    pub fn handle<F>(&mut self, method: HttpMethod, pattern: &str, handler: F) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.handle_with_options(pattern, handler, RouteOptions::new().with_method(method))
    }

    /// Register a named route for a single method
    pub fn handle_named<F>(
        &mut self,
        name: &str,
        method: HttpMethod,
        pattern: &str,
        handler: F,
    ) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        let options = RouteOptions::new().named(name).with_method(method);
        self.handle_with_options(pattern, handler, options)
    }

    /// Add a GET route
    pub fn get<F>(&mut self, pattern: &str, handler: F) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.handle(HttpMethod::GET, pattern, handler)
    }

    /// Add a POST route
    pub fn post<F>(&mut self, pattern: &str, handler: F) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.handle(HttpMethod::POST, pattern, handler)
    }

    /// Add a PUT route
    pub fn put<F>(&mut self, pattern: &str, handler: F) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.handle(HttpMethod::PUT, pattern, handler)
    }

    /// Add a DELETE route
    pub fn delete<F>(&mut self, pattern: &str, handler: F) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.handle(HttpMethod::DELETE, pattern, handler)
    }

    /// Open a group sharing a path prefix, name prefix, defaults and requirements
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        RouteGroup::new(self, prefix)
    }

    pub(crate) fn add_route(
        &mut self,
        pattern: &str,
        handler: Handler,
        options: RouteOptions,
    ) -> RoutingResult<usize> {
        let route = RouteDefinition::new(pattern, handler, options)?;
        let description = format!("{:?} {}", route.methods(), route.pattern());
        let index = self.registry.register(route)?;
        log::debug!("Registered route #{} {}", index, description);
        Ok(index)
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    /// Snapshot of all definitions in registration order
    pub fn route_definitions(&self) -> Vec<RouteDefinition> {
        self.registry.route_definitions()
    }

    pub fn route_definition(&self, name: &str) -> Option<RouteDefinition> {
        self.registry.route_definition(name)
    }

    pub fn url_generator(&self) -> UrlGenerator<'_> {
        UrlGenerator::new(&self.registry)
    }

    pub fn match_request(&self, request: &HttpRequest) -> RouteMatch {
        self.match_route(request.method(), request.path(), request.host(), request.scheme())
    }

    /// Match a method and path given the request host and scheme
    pub fn match_route(&self, method: &HttpMethod, path: &str, host: &str, scheme: &str) -> RouteMatch {
        let normalized = normalize_path(path);
        let segments = split_segments(&normalized);

        let mut best: Option<(&RouteDefinition, usize, PathParams)> = None;
        let mut allowed: Vec<HttpMethod> = Vec::new();

        for index in self.registry.candidates(&segments) {
            let Some(route) = self.registry.get(index) else {
                continue;
            };
            if !route.matches_host(host) || !route.matches_scheme(scheme) {
                continue;
            }
            let Some(mut params) = route.match_path(&segments) else {
                continue;
            };
            route.apply_defaults(&mut params);
            if !route.accepts_locale(&params) {
                continue;
            }
            if !route.allows_method(method) {
                allowed.extend(route.methods().iter().copied());
                continue;
            }

            let better = match &best {
                None => true,
                Some((current, _, _)) => route.priority() > current.priority(),
            };
            if better {
                best = Some((route, index, params));
            }
        }

        if let Some((route, index, params)) = best {
            return RouteMatch::Found(MatchedRoute {
                handler: route.handler().clone(),
                params,
                attributes: route.attributes().clone(),
                route_index: index,
            });
        }

        if allowed.is_empty() {
            return RouteMatch::NotFound;
        }

        allowed.sort_by_key(|m| m.as_str());
        allowed.dedup();
        let mut attributes = RouteAttributes::new();
        attributes.insert(
            ATTR_METHODS.to_string(),
            Value::Array(allowed.iter().map(|m| Value::from(m.as_str())).collect()),
        );
        RouteMatch::MethodNotAllowed { allowed, attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(body: &'static str) -> impl Fn(&HttpRequest, &PathParams) -> HttpResponse {
        move |_, _| HttpResponse::ok().text(body)
    }

    fn body_of(router: &Router, method: HttpMethod, path: &str) -> Option<String> {
        let request = HttpRequest::new(method, path);
        router.match_request(&request).found().map(|m| {
            m.call(&request).body_string().unwrap_or_default().to_string()
        })
    }

    #[test]
    fn test_static_route_match() {
        let mut router = Router::new();
        router.get("/health", text("up")).unwrap();
        assert_eq!(body_of(&router, HttpMethod::GET, "/health").as_deref(), Some("up"));
        assert_eq!(body_of(&router, HttpMethod::GET, "/health/").as_deref(), Some("up"));
        assert_eq!(body_of(&router, HttpMethod::GET, "/health//").as_deref(), Some("up"));
        assert!(matches!(
            router.match_route(&HttpMethod::GET, "/missing", "", "http"),
            RouteMatch::NotFound
        ));
    }

    #[test]
    fn test_repeated_slashes_reach_root() {
        let mut router = Router::new();
        router.get("/", text("root")).unwrap();
        assert_eq!(body_of(&router, HttpMethod::GET, "///").as_deref(), Some("root"));
    }

    #[test]
    fn test_param_binding() {
        let mut router = Router::new();
        router.get("/users/:id/posts/:post", text("post")).unwrap();
        let matched = router
            .match_route(&HttpMethod::GET, "/users/7/posts/99", "", "http")
            .found()
            .unwrap();
        assert_eq!(matched.param("id"), Some("7"));
        assert_eq!(matched.param("post"), Some("99"));
    }

    #[test]
    fn test_priority_then_registration_order() {
        let mut router = Router::new();
        router.get("/items/:id", text("first")).unwrap();
        router.get("/items/:slug", text("second")).unwrap();
        router
            .handle_with_options(
                "/items/special",
                text("special"),
                RouteOptions::new().with_method(HttpMethod::GET).with_priority(-1),
            )
            .unwrap();

        assert_eq!(body_of(&router, HttpMethod::GET, "/items/special").as_deref(), Some("first"));
        assert_eq!(body_of(&router, HttpMethod::GET, "/items/1").as_deref(), Some("first"));
    }

    #[test]
    fn test_method_not_allowed_collects_sorted_methods() {
        let mut router = Router::new();
        router.put("/doc", text("put")).unwrap();
        router.delete("/doc", text("delete")).unwrap();
        router.get("/doc", text("get")).unwrap();

        match router.match_route(&HttpMethod::POST, "/doc", "", "http") {
            RouteMatch::MethodNotAllowed { allowed, attributes } => {
                assert_eq!(allowed, vec![HttpMethod::DELETE, HttpMethod::GET, HttpMethod::PUT]);
                assert_eq!(attributes[ATTR_METHODS], serde_json::json!(["DELETE", "GET", "PUT"]));
            }
            other => panic!("expected method not allowed, got {:?}", other),
        }
    }

    #[test]
    fn test_host_and_scheme_constraints() {
        let mut router = Router::new();
        router
            .handle_with_options(
                "/admin",
                text("admin"),
                RouteOptions::new().with_host("admin.example.com").with_scheme("https"),
            )
            .unwrap();

        assert!(router.match_route(&HttpMethod::GET, "/admin", "admin.example.com", "https").is_found());
        assert!(!router.match_route(&HttpMethod::GET, "/admin", "admin.example.com", "http").is_found());
        assert!(!router.match_route(&HttpMethod::GET, "/admin", "www.example.com", "https").is_found());
    }

    #[test]
    fn test_defaults_fill_unbound_params() {
        let mut router = Router::new();
        router
            .handle_with_options(
                "/list/:page?",
                text("list"),
                RouteOptions::new().with_default("page", "1").with_default("sort", "asc"),
            )
            .unwrap();

        let matched = router.match_route(&HttpMethod::GET, "/list", "", "http").found().unwrap();
        assert_eq!(matched.param("page"), Some("1"));
        assert_eq!(matched.param("sort"), Some("asc"));

        let matched = router.match_route(&HttpMethod::GET, "/list/3", "", "http").found().unwrap();
        assert_eq!(matched.param("page"), Some("3"));
    }

    #[test]
    fn test_locale_allow_list() {
        let mut router = Router::new();
        router
            .handle_with_options(
                "/:_locale/about",
                text("about"),
                RouteOptions::new().with_locales(["en", "fr"]),
            )
            .unwrap();

        assert!(router.match_route(&HttpMethod::GET, "/fr/about", "", "http").is_found());
        assert!(!router.match_route(&HttpMethod::GET, "/de/about", "", "http").is_found());
    }
}
