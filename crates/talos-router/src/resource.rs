//! Resource and operation descriptors.
//!
//! The routing tree is built from an explicit configuration structure: each
//! resource names its own literal path, how many trailing wildcard segments
//! it captures for nested children, at most one parent it nests in, and its
//! operations. The tree builder walks this structure once at startup.

use crate::endpoint::ParamSpec;
use std::sync::Arc;
use talos_core::{AnyValue, Args, CallError, HandlerFn, TypeDescriptor};

/// One callable operation of a resource.
///
/// # Example
///
/// ```rust
/// use talos_router::OperationDescriptor;
///
/// let op = OperationDescriptor::get(|_args| Ok(Box::new("pong".to_string()) as _))
///     .returns::<String>();
/// assert_eq!(op.method(), "GET");
/// ```
#[derive(Clone)]
pub struct OperationDescriptor {
    method: String,
    params: Vec<ParamSpec>,
    returns: TypeDescriptor,
    content_type: Option<String>,
    handler: HandlerFn,
}

impl OperationDescriptor {
    /// Creates an operation for an arbitrary method name.
    #[must_use]
    pub fn new<F>(method: &str, handler: F) -> Self
    where
        F: Fn(Args) -> Result<AnyValue, CallError> + Send + Sync + 'static,
    {
        Self {
            method: method.trim().to_ascii_uppercase(),
            params: Vec::new(),
            returns: TypeDescriptor::of::<()>(),
            content_type: None,
            handler: Arc::new(handler),
        }
    }

    /// Creates a GET operation.
    #[must_use]
    pub fn get<F>(handler: F) -> Self
    where
        F: Fn(Args) -> Result<AnyValue, CallError> + Send + Sync + 'static,
    {
        Self::new("GET", handler)
    }

    /// Creates a POST operation.
    #[must_use]
    pub fn post<F>(handler: F) -> Self
    where
        F: Fn(Args) -> Result<AnyValue, CallError> + Send + Sync + 'static,
    {
        Self::new("POST", handler)
    }

    /// Creates a PUT operation.
    #[must_use]
    pub fn put<F>(handler: F) -> Self
    where
        F: Fn(Args) -> Result<AnyValue, CallError> + Send + Sync + 'static,
    {
        Self::new("PUT", handler)
    }

    /// Creates a DELETE operation.
    #[must_use]
    pub fn delete<F>(handler: F) -> Self
    where
        F: Fn(Args) -> Result<AnyValue, CallError> + Send + Sync + 'static,
    {
        Self::new("DELETE", handler)
    }

    /// Appends a path item parameter.
    #[must_use]
    pub fn item<T: 'static>(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::item::<T>(name));
        self
    }

    /// Appends a multipart part parameter.
    #[must_use]
    pub fn part<T: 'static>(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::part::<T>(name));
        self
    }

    /// Appends the body parameter.
    #[must_use]
    pub fn body<T: 'static>(mut self) -> Self {
        self.params.push(ParamSpec::body::<T>());
        self
    }

    /// Appends a trailing variadic parameter.
    #[must_use]
    pub fn variadic<T: 'static>(mut self, name: impl Into<String>) -> Self {
        self.params.push(ParamSpec::variadic::<T>(name));
        self
    }

    /// Declares the return type.
    #[must_use]
    pub fn returns<T: 'static>(mut self) -> Self {
        self.returns = TypeDescriptor::of::<T>();
        self
    }

    /// Declares the response content type.
    ///
    /// Without this, the registry's binary/text fallback for the return
    /// type is used. A bare `base64` parameter (for example
    /// `application/octet-stream; base64`) makes the dispatcher wrap the
    /// encoded response in Base64.
    #[must_use]
    pub fn content_type(mut self, raw: impl Into<String>) -> Self {
        self.content_type = Some(raw.into());
        self
    }

    /// Returns the uppercase method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        String,
        Vec<ParamSpec>,
        TypeDescriptor,
        Option<String>,
        HandlerFn,
    ) {
        (
            self.method,
            self.params,
            self.returns,
            self.content_type,
            self.handler,
        )
    }
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("method", &self.method)
            .field("params", &self.params.len())
            .field("returns", &self.returns)
            .finish()
    }
}

/// A declared resource: its place in the nesting tree and its operations.
///
/// # Example
///
/// ```rust
/// use talos_router::{OperationDescriptor, ResourceDescriptor};
///
/// let albums = ResourceDescriptor::new("album", "/albums")
///     .trailing_wildcards(1)
///     .operation(OperationDescriptor::get(|_args| Ok(Box::new(()) as _)));
/// assert_eq!(albums.name(), "album");
/// assert_eq!(albums.wildcards(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    name: String,
    path: String,
    wildcards: usize,
    parents: Vec<String>,
    operations: Vec<OperationDescriptor>,
}

impl ResourceDescriptor {
    /// Creates a resource with its own literal path.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            wildcards: 0,
            parents: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Sets how many trailing wildcard segments this resource captures for
    /// resources nested under it.
    #[must_use]
    pub fn trailing_wildcards(mut self, count: usize) -> Self {
        self.wildcards = count;
        self
    }

    /// Nests this resource under a parent resource.
    ///
    /// A resource has at most one parent; every call is recorded and a
    /// second declaration is rejected when the tree is built.
    #[must_use]
    pub fn nested_in(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Adds an operation.
    #[must_use]
    pub fn operation(mut self, operation: OperationDescriptor) -> Self {
        self.operations.push(operation);
        self
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resource's own literal path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the trailing wildcard capture count.
    #[must_use]
    pub fn wildcards(&self) -> usize {
        self.wildcards
    }

    /// Returns the parent resource name, if nested.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    pub(crate) fn declared_parents(&self) -> &[String] {
        &self.parents
    }

    /// Returns the declared operations.
    #[must_use]
    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Returns the literal segments of the resource's own path.
    pub(crate) fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}
