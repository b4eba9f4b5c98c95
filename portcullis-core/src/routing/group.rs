use std::collections::HashMap;
use std::sync::Arc;

use super::error::RoutingResult;
use super::pattern::join_paths;
use super::route::{PathParams, RouteOptions};
use super::router::Router;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Registers routes under a shared path prefix
///
/// The name prefix applies only to named routes. Group defaults and
/// requirements fill keys a route does not set itself.
///
/// ```rust,ignore
/// let mut admin = router.group("/admin").with_name_prefix("admin_");
/// admin.handle_named("users", HttpMethod::GET, "/users", list_users)?;
/// // registers "admin_users" at /admin/users
/// ```
pub struct RouteGroup<'r> {
    router: &'r mut Router,
    path_prefix: String,
    name_prefix: String,
    defaults: HashMap<String, String>,
    requirements: HashMap<String, String>,
}

impl<'r> RouteGroup<'r> {
    pub(crate) fn new(router: &'r mut Router, prefix: &str) -> Self {
        Self {
            router,
            path_prefix: prefix.trim().to_string(),
            name_prefix: String::new(),
            defaults: HashMap::new(),
            requirements: HashMap::new(),
        }
    }

    pub fn with_name_prefix(mut self, prefix: &str) -> Self {
        self.name_prefix = prefix.to_string();
        self
    }

    pub fn with_default(mut self, param: &str, value: &str) -> Self {
        self.defaults.insert(param.to_string(), value.to_string());
        self
    }

    pub fn with_requirement(mut self, param: &str, pattern: &str) -> Self {
        self.requirements.insert(param.to_string(), pattern.to_string());
        self
    }

    pub fn prefix(&self) -> &str {
        &self.path_prefix
    }

    pub fn handle_with_options<F>(
        &mut self,
        pattern: &str,
        handler: F,
        mut options: RouteOptions,
    ) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        if let Some(name) = options.name.take() {
            options.name = Some(format!("{}{}", self.name_prefix, name));
        }
        for (key, value) in &self.defaults {
            options.defaults.entry(key.clone()).or_insert_with(|| value.clone());
        }
        for (key, value) in &self.requirements {
            options.requirements.entry(key.clone()).or_insert_with(|| value.clone());
        }

        let pattern = join_paths(&self.path_prefix, pattern);
        self.router.add_route(&pattern, Arc::new(handler), options)
    }

    pub fn handle<F>(&mut self, method: HttpMethod, pattern: &str, handler: F) -> RoutingResult<usize>
    where
        F: Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync + 'static,
    {
        self.handle_with_options(pattern, handler, RouteOptions::new().with_method(method))
    }

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
}
