//! Reverse routing: build paths and URLs from route names and parameters

use std::collections::{BTreeMap, HashMap};

use super::error::{RoutingError, RoutingResult};
use super::pattern::Segment;
use super::registry::RouteRegistry;
use super::route::RouteDefinition;

/// Generates paths for named routes of a registry
#[derive(Debug, Clone, Copy)]
pub struct UrlGenerator<'a> {
    registry: &'a RouteRegistry,
}

impl<'a> UrlGenerator<'a> {
    pub fn new(registry: &'a RouteRegistry) -> Self {
        Self { registry }
    }

    /// Build the path of route `name`
    ///
    /// Values come from `params`, then from the route defaults. Omitted
    /// optional params and empty catch-alls contribute no segment.
    pub fn generate_path(&self, name: &str, params: &HashMap<String, String>) -> RoutingResult<String> {
        let route = self
            .registry
            .by_name(name)
            .ok_or_else(|| RoutingError::RouteNotFound(name.to_string()))?;

        let mut parts: Vec<String> = Vec::with_capacity(route.segments().len());
        for segment in route.segments() {
            match segment {
                Segment::Static(value) => parts.push(value.clone()),
                Segment::Param { name: param, optional } => {
                    match lookup(route, params, param).filter(|v| !v.is_empty()) {
                        Some(value) => {
                            check_requirement(route, name, param, value)?;
                            parts.push(value.to_string());
                        }
                        None if *optional => {}
                        None => {
                            return Err(RoutingError::MissingRequiredParameter {
                                route: name.to_string(),
                                parameter: param.clone(),
                            })
                        }
                    }
                }
                Segment::Wildcard { name: param, catch_all: false } => {
                    if param.is_empty() {
                        return Err(RoutingError::UnnamedWildcard(name.to_string()));
                    }
                    let value = lookup(route, params, param).filter(|v| !v.is_empty()).ok_or_else(
                        || RoutingError::MissingRequiredParameter {
                            route: name.to_string(),
                            parameter: param.clone(),
                        },
                    )?;
                    if value.contains('/') {
                        return Err(RoutingError::InvalidWildcardValue {
                            route: name.to_string(),
                            parameter: param.clone(),
                        });
                    }
                    check_requirement(route, name, param, value)?;
                    parts.push(value.to_string());
                }
                Segment::Wildcard { name: param, catch_all: true } => {
                    if let Some(value) = lookup(route, params, param) {
                        parts.extend(
                            value.trim_matches('/').split('/').filter(|s| !s.is_empty()).map(String::from),
                        );
                    }
                }
            }
        }

        // A route pattern of "/" is a single empty static segment.
        let parts: Vec<String> = parts.into_iter().filter(|p| !p.is_empty()).collect();
        Ok(format!("/{}", parts.join("/")))
    }

    /// Build the path of route `name` followed by an encoded query string
    ///
    /// Query keys are emitted in sorted order; empty keys are skipped.
    pub fn generate_url(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> RoutingResult<String> {
        let path = self.generate_path(name, params)?;

        let sorted: BTreeMap<&str, &str> = query
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        if sorted.is_empty() {
            return Ok(path);
        }

        let encoded = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        Ok(format!("{}?{}", path, encoded))
    }
}

/// Supplied value, or the route default when it is absent or empty
fn lookup<'p>(
    route: &'p RouteDefinition,
    params: &'p HashMap<String, String>,
    name: &str,
) -> Option<&'p str> {
    params
        .get(name)
        .filter(|value| !value.is_empty())
        .or_else(|| route.defaults().get(name))
        .map(|s| s.as_str())
}

fn check_requirement(
    route: &RouteDefinition,
    route_name: &str,
    param: &str,
    value: &str,
) -> RoutingResult<()> {
    if route.satisfies(param, value) {
        Ok(())
    } else {
        Err(RoutingError::RequirementNotSatisfied {
            route: route_name.to_string(),
            parameter: param.to_string(),
            value: value.to_string(),
        })
    }
}
