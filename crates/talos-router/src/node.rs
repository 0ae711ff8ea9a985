//! Routing trie node.

use crate::endpoint::Endpoint;
use crate::items::Items;
use std::collections::HashMap;
use talos_core::ConfigError;

/// Reserved child key matching any single path segment.
pub const WILDCARD: &str = "*";

/// One level of the routing trie.
///
/// Children are keyed by literal segment, with [`WILDCARD`] as the
/// any-segment child. Each node holds at most one endpoint per uppercase
/// method name. A node flagged `catch_all` holds a variadic endpoint and
/// absorbs any trailing segments lookup cannot otherwise consume.
///
/// Nodes are created during registration and immutable afterwards; the
/// whole trie is shared read-only across requests.
#[derive(Debug, Default)]
pub struct Node {
    children: HashMap<String, Node>,
    endpoints: HashMap<String, Endpoint>,
    catch_all: bool,
}

impl Node {
    /// Creates an empty node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the child for a literal or wildcard segment, creating it if
    /// absent.
    pub(crate) fn child_mut(&mut self, segment: &str) -> &mut Node {
        self.children.entry(segment.to_string()).or_default()
    }

    /// Marks this node as absorbing trailing segments.
    pub(crate) fn set_catch_all(&mut self) {
        self.catch_all = true;
    }

    /// Inserts an endpoint for its method name.
    ///
    /// Duplicate registration errors distinguish one resource registering
    /// the same method twice from two resources colliding on the path.
    pub(crate) fn insert_endpoint(
        &mut self,
        path: &str,
        endpoint: Endpoint,
    ) -> Result<(), ConfigError> {
        let method = endpoint.method().to_string();
        if let Some(existing) = self.endpoints.get(&method) {
            if existing.resource() == endpoint.resource() {
                return Err(ConfigError::DuplicateEndpoint {
                    resource: endpoint.resource().to_string(),
                    method,
                    path: path.to_string(),
                });
            }
            return Err(ConfigError::EndpointCollision {
                existing: existing.resource().to_string(),
                incoming: endpoint.resource().to_string(),
                method,
                path: path.to_string(),
            });
        }
        self.endpoints.insert(method, endpoint);
        Ok(())
    }

    /// Returns the endpoint for an uppercase method name.
    #[must_use]
    pub fn endpoint(&self, method: &str) -> Option<&Endpoint> {
        self.endpoints.get(method)
    }

    /// Returns true if this node routes at least one method.
    #[must_use]
    pub fn has_endpoints(&self) -> bool {
        !self.endpoints.is_empty()
    }

    /// Returns the node's registered method names, sorted.
    #[must_use]
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.keys().cloned().collect();
        names.sort();
        names
    }

    /// Walks the trie over decoded path segments.
    ///
    /// An exact child match is preferred at each step; absent that, the
    /// wildcard child is taken and the consumed segment is appended to
    /// `items`. If neither exists, a catch-all node absorbs the remaining
    /// segments; otherwise the lookup fails. Single pass, no backtracking.
    pub(crate) fn lookup<'a>(&'a self, segments: &[&str], items: &mut Items) -> Option<&'a Node> {
        let mut node = self;
        for (position, segment) in segments.iter().enumerate() {
            if let Some(child) = node.children.get(*segment) {
                node = child;
            } else if let Some(wild) = node.children.get(WILDCARD) {
                items.push(*segment);
                node = wild;
            } else if node.catch_all {
                for trailing in &segments[position..] {
                    items.push(*trailing);
                }
                return Some(node);
            } else {
                return None;
            }
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use talos_core::{AnyValue, HandlerFn, ParserRegistry, TypeDescriptor};

    fn endpoint(resource: &str, method: &str) -> Endpoint {
        let handler: HandlerFn = Arc::new(|_args| Ok(Box::new(()) as AnyValue));
        Endpoint::bind(
            resource,
            method,
            Vec::new(),
            TypeDescriptor::of::<()>(),
            None,
            handler,
            0,
            &ParserRegistry::new(),
        )
        .expect("bind")
    }

    #[test]
    fn test_exact_walk() {
        let mut root = Node::new();
        root.child_mut("a").child_mut("b");

        let mut items = Items::new();
        let node = root.lookup(&["a", "b"], &mut items);
        assert!(node.is_some());
        assert!(items.is_empty());
    }

    #[test]
    fn test_wildcard_captures_in_order() {
        let mut root = Node::new();
        root.child_mut("a").child_mut(WILDCARD).child_mut(WILDCARD);

        let mut items = Items::new();
        let node = root.lookup(&["a", "7", "9"], &mut items);
        assert!(node.is_some());
        assert_eq!(items.iter().collect::<Vec<_>>(), vec!["7", "9"]);
    }

    #[test]
    fn test_exact_preferred_over_wildcard() {
        let mut root = Node::new();
        root.child_mut("me");
        root.child_mut(WILDCARD);

        let mut items = Items::new();
        root.lookup(&["me"], &mut items).unwrap();
        assert!(items.is_empty());

        let mut items = Items::new();
        root.lookup(&["other"], &mut items).unwrap();
        assert_eq!(items.get(0), Some("other"));
    }

    #[test]
    fn test_dead_end_is_none() {
        let mut root = Node::new();
        root.child_mut("a");

        let mut items = Items::new();
        assert!(root.lookup(&["b"], &mut items).is_none());
        assert!(root.lookup(&["a", "b"], &mut items).is_none());
    }

    #[test]
    fn test_catch_all_absorbs_trailing() {
        let mut root = Node::new();
        let files = root.child_mut("files");
        files.set_catch_all();

        let mut items = Items::new();
        let node = root.lookup(&["files", "img", "logo.png"], &mut items).unwrap();
        assert!(node.catch_all);
        assert_eq!(items.iter().collect::<Vec<_>>(), vec!["img", "logo.png"]);

        // Zero trailing segments also lands on the node.
        let mut items = Items::new();
        assert!(root.lookup(&["files"], &mut items).is_some());
        assert!(items.is_empty());
    }

    #[test]
    fn test_duplicate_endpoint_same_resource() {
        let mut node = Node::new();
        node.insert_endpoint("/x", endpoint("album", "GET")).unwrap();
        let err = node
            .insert_endpoint("/x", endpoint("album", "GET"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEndpoint { .. }));
    }

    #[test]
    fn test_endpoint_collision_cross_resource() {
        let mut node = Node::new();
        node.insert_endpoint("/x", endpoint("album", "GET")).unwrap();
        let err = node
            .insert_endpoint("/x", endpoint("track", "GET"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EndpointCollision { .. }));
    }

    #[test]
    fn test_distinct_methods_coexist() {
        let mut node = Node::new();
        node.insert_endpoint("/x", endpoint("album", "GET")).unwrap();
        node.insert_endpoint("/x", endpoint("album", "POST")).unwrap();
        assert_eq!(node.method_names(), vec!["GET", "POST"]);
        assert!(node.endpoint("GET").is_some());
        assert!(node.endpoint("PUT").is_none());
    }
}
