//! The transport-facing response model.

use crate::envelope::ErrorBody;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;

/// A fully materialized response: status, headers, and body bytes.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use talos_dispatch::Response;
///
/// let response = Response::with_body(StatusCode::OK, "text/plain; charset=utf-8", b"pong".to_vec());
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.body(), b"pong");
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    /// Creates an empty 204 No Content response.
    #[must_use]
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates a response with a body and its content type.
    #[must_use]
    pub fn with_body(status: StatusCode, content_type: &str, body: Vec<u8>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header_value(content_type));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Creates a JSON error-envelope response.
    #[must_use]
    pub fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        let body = ErrorBody::new(code, message).render();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            status,
            headers,
            body,
        }
    }

    /// Adds an `Allow` header listing permitted method names.
    #[must_use]
    pub fn allow(mut self, methods: &[String]) -> Self {
        self.headers
            .insert(header::ALLOW, header_value(&methods.join(", ")));
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decomposes into status, headers, and body for the transport to write.
    #[must_use]
    pub fn into_pieces(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

// Content types and method lists are registry-normalized ASCII; the
// octet-stream fallback only guards against a pathological registry key.
fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_content() {
        let response = Response::no_content();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_error_envelope_shape() {
        let response = Response::error(StatusCode::NOT_FOUND, "NOT_FOUND", "no route");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["code"], "NOT_FOUND");
        assert_eq!(parsed["message"], "no route");
    }

    #[test]
    fn test_allow_header() {
        let response = Response::error(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "nope",
        )
        .allow(&["GET".to_string(), "POST".to_string()]);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET, POST");
    }
}
