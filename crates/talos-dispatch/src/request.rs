//! The transport-facing request model.
//!
//! The transport (whatever accepts connections and parses framing) hands the
//! dispatcher a method name, a raw path, headers, and the body or multipart
//! part streams. Nothing here is buffered; payloads stay as readers until an
//! endpoint argument actually consumes them.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::io::Read;

/// One multipart part as delivered by the transport.
pub struct Part {
    name: String,
    content_type: Option<String>,
    payload: Box<dyn Read + Send>,
}

impl Part {
    /// Creates a part from its form-field name and raw payload stream.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content_type: Option<&str>,
        payload: Box<dyn Read + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(str::to_string),
            payload,
        }
    }

    /// Returns the form-field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>, Box<dyn Read + Send>) {
        (self.name, self.content_type, self.payload)
    }
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Part")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// An incoming request, ready for dispatch.
///
/// # Example
///
/// ```rust
/// use talos_dispatch::Request;
///
/// let request = Request::new("GET", "/albums/42");
/// assert_eq!(request.method(), "GET");
/// assert_eq!(request.path(), "/albums/42");
/// ```
pub struct Request {
    method: String,
    path: String,
    headers: HeaderMap,
    body: Option<Box<dyn Read + Send>>,
    parts: Vec<Part>,
}

impl Request {
    /// Creates a request with no headers and no payload.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            parts: Vec::new(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attaches the body stream.
    #[must_use]
    pub fn body(mut self, payload: Box<dyn Read + Send>) -> Self {
        self.body = Some(payload);
        self
    }

    /// Appends a multipart part. Repeated names are kept in arrival order.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Returns the method name as delivered (not yet uppercased).
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the raw, still percent-encoded path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub(crate) fn into_pieces(
        self,
    ) -> (
        String,
        String,
        HeaderMap,
        Option<Box<dyn Read + Send>>,
        Vec<Part>,
    ) {
        (self.method, self.path, self.headers, self.body, self.parts)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .field("parts", &self.parts)
            .finish()
    }
}
