//! Routing tree, endpoint binding, and resource nesting for Talos.
//!
//! Resources declare their literal paths, trailing wildcard captures, and
//! nesting parents up front; [`TreeBuilder`] resolves the nesting relation,
//! binds every operation against the parser registry, and produces an
//! immutable [`Tree`]. Lookup walks decoded path segments in a single pass
//! and yields a [`Resolution`]: a matched [`Endpoint`] with its captured
//! [`Items`], a method-not-allowed outcome with the node's method set, or
//! not-found.

pub mod endpoint;
pub mod items;
pub mod node;
pub mod resource;
pub mod tree;

pub use endpoint::{Endpoint, ParamSpec};
pub use items::Items;
pub use node::{Node, WILDCARD};
pub use resource::{OperationDescriptor, ResourceDescriptor};
pub use tree::{Resolution, Tree, TreeBuilder};
