//! The routing tree: build-once registration and per-request lookup.

use crate::endpoint::Endpoint;
use crate::items::Items;
use crate::node::{Node, WILDCARD};
use crate::resource::ResourceDescriptor;
use indexmap::IndexMap;
use std::collections::HashSet;
use talos_core::{ConfigError, ParserRegistry};

/// Outcome of a route lookup.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// A unique endpoint matched; `items` holds the wildcard captures in
    /// left-to-right order.
    Matched {
        /// The resolved endpoint.
        endpoint: &'a Endpoint,
        /// Captured path items.
        items: Items,
    },
    /// The path routes, but not for this method.
    MethodNotAllowed {
        /// The node's registered method names, sorted.
        allowed: Vec<String>,
    },
    /// No node matches the path.
    NotFound,
}

/// Collects resource descriptors and builds the immutable [`Tree`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    resources: IndexMap<String, ResourceDescriptor>,
}

impl TreeBuilder {
    /// Adds a resource. Duplicate names are rejected.
    pub fn resource(mut self, descriptor: ResourceDescriptor) -> Result<Self, ConfigError> {
        let name = descriptor.name().to_string();
        if self.resources.contains_key(&name) {
            return Err(ConfigError::DuplicateResource { name });
        }
        self.resources.insert(name, descriptor);
        Ok(self)
    }

    /// Resolves nesting, binds every operation, and populates the trie.
    pub fn build(self, parsers: &ParserRegistry) -> Result<Tree, ConfigError> {
        let mut root = Node::new();

        for descriptor in self.resources.values() {
            let (prefix, distance) = self.nesting_prefix(descriptor)?;

            let mut path: Vec<String> = prefix;
            path.extend(descriptor.segments().map(str::to_string));
            let resource_depth = path.len();

            for operation in descriptor.operations().iter().cloned() {
                let (method, params, returns, content_type, handler) = operation.into_parts();
                let endpoint = Endpoint::bind(
                    descriptor.name(),
                    &method,
                    params,
                    returns,
                    content_type,
                    handler,
                    distance,
                    parsers,
                )?;

                path.truncate(resource_depth);
                for _ in 0..endpoint.reach() {
                    path.push(WILDCARD.to_string());
                }
                let display_path = format!("/{}", path.join("/"));

                let mut node = &mut root;
                for segment in &path {
                    node = node.child_mut(segment);
                }
                if endpoint.is_variadic() {
                    node.set_catch_all();
                }
                tracing::debug!(
                    resource = descriptor.name(),
                    method = endpoint.method(),
                    path = %display_path,
                    distance,
                    reach = endpoint.reach(),
                    "registered endpoint"
                );
                node.insert_endpoint(&display_path, endpoint)?;
            }
        }

        Ok(Tree { root })
    }

    /// Walks the nesting relation upward, rejecting cycles and unknown
    /// parents, and returns the accumulated segment prefix plus the
    /// wildcard distance it contributes.
    fn nesting_prefix(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<(Vec<String>, usize), ConfigError> {
        if descriptor.declared_parents().len() > 1 {
            return Err(ConfigError::MultipleParents {
                resource: descriptor.name().to_string(),
            });
        }
        let mut visited = HashSet::new();
        visited.insert(descriptor.name());

        let mut chain = Vec::new();
        let mut current = descriptor.parent();
        while let Some(parent_name) = current {
            let parent =
                self.resources
                    .get(parent_name)
                    .ok_or_else(|| ConfigError::UnknownParent {
                        resource: descriptor.name().to_string(),
                        parent: parent_name.to_string(),
                    })?;
            if !visited.insert(parent.name()) {
                return Err(ConfigError::CyclicNesting {
                    resource: parent.name().to_string(),
                });
            }
            chain.push(parent);
            current = parent.parent();
        }
        chain.reverse();

        let mut prefix = Vec::new();
        let mut distance = 0;
        for ancestor in chain {
            prefix.extend(ancestor.segments().map(str::to_string));
            for _ in 0..ancestor.wildcards() {
                prefix.push(WILDCARD.to_string());
                distance += 1;
            }
        }
        Ok((prefix, distance))
    }
}

/// The immutable routing trie, safe for unsynchronized concurrent reads.
#[derive(Debug)]
pub struct Tree {
    root: Node,
}

impl Tree {
    /// Starts collecting resources.
    #[must_use]
    pub fn builder() -> TreeBuilder {
        TreeBuilder::default()
    }

    /// Looks up decoded path segments and probes the method name
    /// (case-insensitively).
    #[must_use]
    pub fn lookup<'a>(&'a self, method: &str, segments: &[&str]) -> Resolution<'a> {
        let mut items = Items::new();
        let Some(node) = self.root.lookup(segments, &mut items) else {
            return Resolution::NotFound;
        };
        if !node.has_endpoints() {
            return Resolution::NotFound;
        }
        let method = method.trim().to_ascii_uppercase();
        match node.endpoint(&method) {
            Some(endpoint) => Resolution::Matched { endpoint, items },
            None => Resolution::MethodNotAllowed {
                allowed: node.method_names(),
            },
        }
    }

    /// Convenience lookup over a raw `/`-separated path.
    #[must_use]
    pub fn resolve<'a>(&'a self, method: &str, path: &str) -> Resolution<'a> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.lookup(method, &segments)
    }
}
