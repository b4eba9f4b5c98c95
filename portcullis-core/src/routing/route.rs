//! Route definitions and the options used to declare them

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use super::error::{RoutingError, RoutingResult};
use super::pattern::{parse_pattern, Segment};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Parameters bound while matching a path, including filled-in defaults
pub type PathParams = HashMap<String, String>;

/// Free-form route metadata; the `_`-prefixed keys are reserved
pub type RouteAttributes = HashMap<String, Value>;

/// Route handler function type
pub type Handler = Arc<dyn Fn(&HttpRequest, &PathParams) -> HttpResponse + Send + Sync>;

pub const ATTR_ROUTE: &str = "_route";
pub const ATTR_PATTERN: &str = "_pattern";
pub const ATTR_METHODS: &str = "_methods";
pub const ATTR_HOST: &str = "_host";
pub const ATTR_SCHEMES: &str = "_schemes";
pub const ATTR_LOCALES: &str = "_locales";

/// Parameter checked against a route's locale allow-list
pub const LOCALE_PARAM: &str = "_locale";

/// Declarative options for a single route
///
/// ```rust,ignore
/// let options = RouteOptions::new()
///     .named("user_show")
///     .with_method(HttpMethod::GET)
///     .with_requirement("id", r"\d+")
///     .with_priority(10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub(crate) name: Option<String>,
    pub(crate) methods: Vec<HttpMethod>,
    pub(crate) host: Option<String>,
    pub(crate) schemes: Vec<String>,
    pub(crate) requirements: HashMap<String, String>,
    pub(crate) defaults: HashMap<String, String>,
    pub(crate) locales: Vec<String>,
    pub(crate) priority: i32,
    pub(crate) attributes: RouteAttributes,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: &str) -> Self {
        let name = name.trim();
        self.name = if name.is_empty() { None } else { Some(name.to_string()) };
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn with_methods<I: IntoIterator<Item = HttpMethod>>(self, methods: I) -> Self {
        methods.into_iter().fold(self, |options, method| options.with_method(method))
    }

    pub fn with_host(mut self, host: &str) -> Self {
        let host = host.trim();
        self.host = if host.is_empty() { None } else { Some(host.to_string()) };
        self
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        let scheme = scheme.trim().to_lowercase();
        if !scheme.is_empty() && !self.schemes.contains(&scheme) {
            self.schemes.push(scheme);
        }
        self
    }

    pub fn with_requirement(mut self, param: &str, pattern: &str) -> Self {
        self.requirements.insert(param.to_string(), pattern.to_string());
        self
    }

    pub fn with_default(mut self, param: &str, value: &str) -> Self {
        self.defaults.insert(param.to_string(), value.to_string());
        self
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    /// Higher priority wins among matching routes; ties go to registration order
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// A registered route: parsed pattern, compiled requirements and metadata
#[derive(Clone)]
pub struct RouteDefinition {
    name: Option<String>,
    pattern: String,
    segments: Vec<Segment>,
    handler: Handler,
    methods: Vec<HttpMethod>,
    host: Option<String>,
    schemes: Vec<String>,
    requirements: HashMap<String, Regex>,
    defaults: HashMap<String, String>,
    locales: Vec<String>,
    priority: i32,
    attributes: RouteAttributes,
}

impl RouteDefinition {
    /// Build a definition from a raw pattern, compiling requirements up front
    pub fn new(pattern: &str, handler: Handler, options: RouteOptions) -> RoutingResult<Self> {
        let (pattern, segments) = parse_pattern(pattern);

        let mut requirements = HashMap::new();
        for (param, expr) in options.requirements {
            let (param, expr) = (param.trim(), expr.trim());
            if param.is_empty() || expr.is_empty() {
                continue;
            }
            let regex = Regex::new(&anchor(expr)).map_err(|source| {
                RoutingError::InvalidRequirement {
                    pattern: pattern.clone(),
                    parameter: param.to_string(),
                    source,
                }
            })?;
            requirements.insert(param.to_string(), regex);
        }

        let defaults = options
            .defaults
            .into_iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .collect();

        let mut attributes: RouteAttributes = options
            .attributes
            .into_iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .collect();
        if let Some(name) = &options.name {
            attributes.insert(ATTR_ROUTE.to_string(), Value::from(name.as_str()));
        }
        attributes.insert(ATTR_PATTERN.to_string(), Value::from(pattern.as_str()));
        if !options.methods.is_empty() {
            let methods: Vec<Value> =
                options.methods.iter().map(|m| Value::from(m.as_str())).collect();
            attributes.insert(ATTR_METHODS.to_string(), Value::Array(methods));
        }
        if let Some(host) = &options.host {
            attributes.insert(ATTR_HOST.to_string(), Value::from(host.as_str()));
        }
        if !options.schemes.is_empty() {
            attributes.insert(ATTR_SCHEMES.to_string(), Value::from(options.schemes.clone()));
        }
        if !options.locales.is_empty() {
            attributes.insert(ATTR_LOCALES.to_string(), Value::from(options.locales.clone()));
        }

        Ok(Self {
            name: options.name,
            pattern,
            segments,
            handler,
            methods: options.methods,
            host: options.host,
            schemes: options.schemes,
            requirements,
            defaults,
            locales: options.locales,
            priority: options.priority,
            attributes,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Normalized pattern text
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    pub fn requirement(&self, param: &str) -> Option<&Regex> {
        self.requirements.get(param)
    }

    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn attributes(&self) -> &RouteAttributes {
        &self.attributes
    }

    pub(crate) fn allows_method(&self, method: &HttpMethod) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }

    pub(crate) fn matches_host(&self, host: &str) -> bool {
        match &self.host {
            None => true,
            Some(expected) => expected.eq_ignore_ascii_case(host.trim()),
        }
    }

    pub(crate) fn matches_scheme(&self, scheme: &str) -> bool {
        self.schemes.is_empty() || self.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme))
    }

    pub(crate) fn satisfies(&self, param: &str, value: &str) -> bool {
        self.requirements.get(param).map_or(true, |regex| regex.is_match(value))
    }

    /// Bind `path` against this route's segments, returning the captured params
    pub(crate) fn match_path(&self, path: &[&str]) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut pos = 0;

        for segment in &self.segments {
            match segment {
                Segment::Wildcard { name, catch_all: true } => {
                    let rest = path.get(pos..).unwrap_or_default().join("/");
                    if !name.is_empty() {
                        params.insert(name.clone(), rest);
                    }
                    return Some(params);
                }
                Segment::Wildcard { name, catch_all: false } => {
                    let value = path.get(pos)?;
                    if !name.is_empty() {
                        if !self.satisfies(name, value) {
                            return None;
                        }
                        params.insert(name.clone(), value.to_string());
                    }
                    pos += 1;
                }
                Segment::Param { name, optional } => {
                    let Some(value) = path.get(pos) else {
                        if *optional {
                            continue;
                        }
                        return None;
                    };
                    if !self.satisfies(name, value) {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    pos += 1;
                }
                Segment::Static(expected) => {
                    if path.get(pos) != Some(&expected.as_str()) {
                        return None;
                    }
                    pos += 1;
                }
            }
        }

        (pos == path.len()).then_some(params)
    }

    /// Fill unbound params from defaults
    pub(crate) fn apply_defaults(&self, params: &mut PathParams) {
        for (key, value) in &self.defaults {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    pub(crate) fn accepts_locale(&self, params: &PathParams) -> bool {
        if self.locales.is_empty() {
            return true;
        }
        match params.get(LOCALE_PARAM) {
            Some(locale) if !locale.is_empty() => self.locales.iter().any(|l| l == locale),
            _ => false,
        }
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("host", &self.host)
            .field("schemes", &self.schemes)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

fn anchor(expr: &str) -> String {
    let mut anchored = String::with_capacity(expr.len() + 2);
    if !expr.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(expr);
    if !expr.ends_with('$') {
        anchored.push('$');
    }
    anchored
}
