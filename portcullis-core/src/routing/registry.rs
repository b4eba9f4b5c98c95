use std::collections::HashMap;

use super::error::{RoutingError, RoutingResult};
use super::route::RouteDefinition;
use super::trie::SegmentTrie;

/// Ordered store of route definitions plus the trie indexing them
///
/// Registration order is significant: it breaks priority ties and is the
/// order candidates are examined in.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteDefinition>,
    by_name: HashMap<String, usize>,
    trie: SegmentTrie,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition, returning its registration index
    pub(crate) fn register(&mut self, route: RouteDefinition) -> RoutingResult<usize> {
        if let Some(name) = route.name() {
            if self.by_name.contains_key(name) {
                return Err(RoutingError::DuplicateRouteName(name.to_string()));
            }
        }

        let index = self.routes.len();
        if let Some(name) = route.name() {
            self.by_name.insert(name.to_string(), index);
        }
        self.trie.insert(route.segments(), index);
        self.routes.push(route);
        Ok(index)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&RouteDefinition> {
        self.routes.get(index)
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<&RouteDefinition> {
        self.by_name.get(name).and_then(|&index| self.routes.get(index))
    }

    pub(crate) fn candidates(&self, path_segments: &[&str]) -> Vec<usize> {
        self.trie.candidates(path_segments)
    }

    /// Snapshot of all definitions in registration order
    pub fn route_definitions(&self) -> Vec<RouteDefinition> {
        self.routes.clone()
    }

    pub fn route_definition(&self, name: &str) -> Option<RouteDefinition> {
        self.by_name(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::routing::route::RouteOptions;
    use std::sync::Arc;

    fn route(pattern: &str, name: &str) -> RouteDefinition {
        RouteDefinition::new(pattern, Arc::new(|_, _| HttpResponse::ok()), RouteOptions::new().named(name))
            .unwrap()
    }

    #[test]
    fn test_register_assigns_sequential_indices() {
        let mut registry = RouteRegistry::new();
        assert_eq!(registry.register(route("/a", "a")).unwrap(), 0);
        assert_eq!(registry.register(route("/b", "")).unwrap(), 1);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.route_definition("a").unwrap().pattern(), "/a");
    }

    #[test]
    fn test_duplicate_name_leaves_registry_untouched() {
        let mut registry = RouteRegistry::new();
        registry.register(route("/a", "home")).unwrap();
        let err = registry.register(route("/b", "home")).unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateRouteName(ref name) if name == "home"));
        assert_eq!(registry.len(), 1);
        assert!(registry.candidates(&["b"]).is_empty());
    }
}
