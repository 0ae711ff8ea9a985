//! Error taxonomy for Talos.
//!
//! Failures are split into families with different lifecycles:
//!
//! - [`ConfigError`] — raised only while the routing tree and registries are
//!   being built; halts startup and never occurs while serving
//! - [`ClientError`] — malformed client input; always recoverable, mapped to
//!   a 400-class response
//! - [`ContentError`] — payload negotiation and decoding failures; mapped to
//!   415/413/400 when consuming client input, treated as an internal bug
//!   when producing output
//! - [`CallError`] — the only failures allowed to cross the endpoint-call
//!   boundary: an explicit status+body application error, or a fatal cause
//! - [`DispatchError`] — the union the dispatcher turns into a response

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Errors raised while registering resources, endpoints, or codecs.
///
/// These indicate a misconfigured program and should halt startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One resource declared the same method twice at the same path.
    #[error("duplicate endpoint: {method} {path} declared twice by resource '{resource}'")]
    DuplicateEndpoint {
        /// Resource that declared both endpoints.
        resource: String,
        /// Uppercase method name.
        method: String,
        /// Trie path of the collision.
        path: String,
    },

    /// Two different resources declared the same method at the same path.
    #[error("endpoint collision: {method} {path} declared by both '{existing}' and '{incoming}'")]
    EndpointCollision {
        /// Resource already holding the endpoint.
        existing: String,
        /// Resource attempting the second registration.
        incoming: String,
        /// Uppercase method name.
        method: String,
        /// Trie path of the collision.
        path: String,
    },

    /// The nesting relation forms a cycle.
    #[error("cyclic nesting detected at resource '{resource}'")]
    CyclicNesting {
        /// Resource at which the cycle was observed.
        resource: String,
    },

    /// A resource names a parent that was never registered.
    #[error("resource '{resource}' nests in unknown parent '{parent}'")]
    UnknownParent {
        /// Child resource.
        resource: String,
        /// Missing parent name.
        parent: String,
    },

    /// A resource declares more than one nesting parent.
    #[error("resource '{resource}' declares more than one parent")]
    MultipleParents {
        /// Offending resource name.
        resource: String,
    },

    /// The same resource name was registered more than once.
    #[error("resource '{name}' registered more than once")]
    DuplicateResource {
        /// Offending resource name.
        name: String,
    },

    /// An operation declares fewer item parameters than its nesting prefix
    /// consumes.
    #[error(
        "operation {method} on '{resource}' declares {declared} item parameter(s) \
         but its nesting prefix requires {required}"
    )]
    NotEnoughItems {
        /// Resource declaring the operation.
        resource: String,
        /// Uppercase method name.
        method: String,
        /// Item parameters actually declared.
        declared: usize,
        /// Wildcard segments the nesting prefix contributes.
        required: usize,
    },

    /// An operation declares both part parameters and a body parameter.
    #[error("operation {method} on '{resource}' mixes part and body parameters")]
    PartsWithBody {
        /// Resource declaring the operation.
        resource: String,
        /// Uppercase method name.
        method: String,
    },

    /// An operation declares more than one body parameter.
    #[error("operation {method} on '{resource}' declares more than one body parameter")]
    MultipleBodies {
        /// Resource declaring the operation.
        resource: String,
        /// Uppercase method name.
        method: String,
    },

    /// A variadic parameter is not the last declared parameter.
    #[error("variadic parameter '{param}' of {method} on '{resource}' must be declared last")]
    VariadicNotLast {
        /// Resource declaring the operation.
        resource: String,
        /// Uppercase method name.
        method: String,
        /// Offending parameter name.
        param: String,
    },

    /// An item parameter's type has no registered parser.
    #[error("no item parser registered for parameter '{param}' of type {type_name}")]
    NoItemParser {
        /// Parameter name.
        param: String,
        /// Declared type.
        type_name: String,
    },

    /// An extension or fallback was registered for a content type that has
    /// no codec in any role.
    #[error("content type '{content_type}' has no registered codec")]
    MissingCodec {
        /// The codec-less content type.
        content_type: String,
    },
}

/// What a malformed request got wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// A path item failed conversion to its declared type.
    MalformedItem,
    /// The endpoint requires a body and none was supplied.
    MissingBody,
    /// A body was supplied where none is expected.
    UnexpectedBody,
    /// A declared part name is absent from the request.
    MissingPart,
    /// A part was supplied that the endpoint does not declare.
    UnexpectedPart,
    /// A declared part name arrived with the wrong number of parts.
    PartCountMismatch,
    /// A body or part payload could not be decoded.
    MalformedPayload,
    /// A path segment carried invalid percent-encoding.
    MalformedPath,
}

/// A recoverable client-input error, mapped to a 400 response.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ClientError {
    kind: ClientErrorKind,
    message: String,
}

impl ClientError {
    /// Creates a client error.
    #[must_use]
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A path item that failed conversion, naming the offending argument.
    #[must_use]
    pub fn malformed_item(param: &str, detail: impl fmt::Display) -> Self {
        Self::new(
            ClientErrorKind::MalformedItem,
            format!("malformed path item for parameter '{param}': {detail}"),
        )
    }

    /// Returns what kind of input problem this is.
    #[must_use]
    pub fn kind(&self) -> ClientErrorKind {
        self.kind
    }

    /// Returns the status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// The codec role a negotiation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecRole {
    /// Byte-oriented decoding of request payloads.
    ByteRead,
    /// Byte-oriented encoding of response payloads.
    ByteWrite,
    /// Text-oriented decoding of request payloads.
    TextRead,
    /// Text-oriented encoding of response payloads.
    TextWrite,
}

impl fmt::Display for CodecRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByteRead => write!(f, "byte-read"),
            Self::ByteWrite => write!(f, "byte-write"),
            Self::TextRead => write!(f, "text-read"),
            Self::TextWrite => write!(f, "text-write"),
        }
    }
}

/// Payload negotiation, decoding, or I/O failures.
///
/// The dispatcher maps these to 415 (unsupported type/charset), 413 (over
/// the payload limit), or 400 (malformed) when reading client input, and to
/// a 500-class failure when they occur while producing output.
#[derive(Debug, Error)]
pub enum ContentError {
    /// No codec is registered for the content type in the required role.
    #[error("no {role} codec registered for content type '{content_type}'")]
    UnsupportedType {
        /// Normalized content type.
        content_type: String,
        /// The codec role that was looked up.
        role: CodecRole,
    },

    /// The payload's charset parameter names an unsupported charset.
    #[error("unsupported charset '{charset}'")]
    UnsupportedCharset {
        /// The charset token from the content type.
        charset: String,
    },

    /// No content type could be resolved for an output value.
    ///
    /// This is configuration-shaped: it means a binary/text fallback is
    /// missing for a type the program produces.
    #[error("no content type resolvable for value of type {type_name}")]
    Unresolvable {
        /// The value's declared type.
        type_name: String,
    },

    /// The payload could not be decoded (bad Base64, bad charset data, or a
    /// codec-level parse failure).
    #[error("malformed payload: {message}")]
    Malformed {
        /// Decoder diagnostic.
        message: String,
    },

    /// The payload exceeded the configured size limit.
    #[error("payload exceeds the configured limit of {limit} bytes")]
    PayloadTooLarge {
        /// The configured byte cap.
        limit: u64,
    },

    /// The payload was already consumed once.
    ///
    /// The request flow consumes each payload by value, so hitting this is
    /// an internal invariant violation, not a client fault.
    #[error("payload already consumed")]
    AlreadyConsumed,

    /// Reading the payload stream failed.
    #[error("payload read failed: {0}")]
    Io(std::io::Error),
}

impl ContentError {
    /// Returns the status code when this error arises while reading client
    /// input.
    #[must_use]
    pub fn input_status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedType { .. } | Self::UnsupportedCharset { .. } => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unresolvable { .. } | Self::AlreadyConsumed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Malformed { .. } | Self::Io(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// The only failures an endpoint handler may surface.
///
/// Enforced structurally: [`crate::HandlerFn`] returns `Result<_, CallError>`,
/// so a handler cannot declare any other failure kind.
#[derive(Debug, Error)]
pub enum CallError {
    /// An explicit application-chosen status and body.
    #[error("application error ({status}): {body}")]
    Application {
        /// Response status to surface.
        status: StatusCode,
        /// Response body text.
        body: String,
    },

    /// An unexpected, unrecoverable failure.
    #[error("fatal dispatch failure: {0}")]
    Fatal(anyhow::Error),
}

impl CallError {
    /// Creates an application error with an explicit status and body.
    #[must_use]
    pub fn application(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Application {
            status,
            body: body.into(),
        }
    }

    /// Creates a fatal error from any cause.
    #[must_use]
    pub fn fatal(cause: impl Into<anyhow::Error>) -> Self {
        Self::Fatal(cause.into())
    }
}

/// Union of serve-time failures, produced by endpoint calls and turned into
/// responses by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed client input.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Payload negotiation or decoding failure.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Application or fatal failure surfaced by the handler.
    #[error(transparent)]
    Call(#[from] CallError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_status() {
        let err = ClientError::malformed_item("id", "invalid digit");
        assert_eq!(err.kind(), ClientErrorKind::MalformedItem);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_content_error_input_status() {
        let unsupported = ContentError::UnsupportedType {
            content_type: "application/cbor".to_string(),
            role: CodecRole::ByteRead,
        };
        assert_eq!(
            unsupported.input_status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );

        let too_large = ContentError::PayloadTooLarge { limit: 16 };
        assert_eq!(too_large.input_status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        let malformed = ContentError::Malformed {
            message: "bad base64".to_string(),
        };
        assert_eq!(malformed.input_status_code(), StatusCode::BAD_REQUEST);

        let unresolvable = ContentError::Unresolvable {
            type_name: "Widget".to_string(),
        };
        assert_eq!(
            unresolvable.input_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_already_consumed_is_internal() {
        // A double read cannot be caused by the client; it means the
        // payload was taken out from under the binding layer.
        assert_eq!(
            ContentError::AlreadyConsumed.input_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_call_error_application() {
        let err = CallError::application(StatusCode::CONFLICT, "already exists");
        match err {
            CallError::Application { status, body } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(body, "already exists");
            }
            CallError::Fatal(_) => panic!("expected application error"),
        }
    }

    #[test]
    fn test_codec_role_display() {
        assert_eq!(CodecRole::ByteRead.to_string(), "byte-read");
        assert_eq!(CodecRole::TextWrite.to_string(), "text-write");
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::EndpointCollision {
            existing: "album".to_string(),
            incoming: "track".to_string(),
            method: "GET".to_string(),
            path: "/library/*/albums".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("album"));
        assert!(msg.contains("track"));

        let err = ConfigError::CyclicNesting {
            resource: "a".to_string(),
        };
        assert!(err.to_string().contains("cyclic"));
    }
}
