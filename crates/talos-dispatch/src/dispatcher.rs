//! Request dispatch: route resolution, payload wiring, response encoding.

use crate::config::DispatchConfig;
use crate::request::Request;
use crate::response::Response;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::write::EncoderWriter;
use http::{header, StatusCode};
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use std::io::{Read, Write};
use talos_content::{ContentRegistry, Data, LimitedReader, MediaType};
use talos_core::{
    AnyValue, ClientError, ClientErrorKind, ContentError, DispatchError, TypeDescriptor,
};
use talos_router::{Endpoint, Resolution, Tree};

/// Ties the routing tree and content registry together and turns requests
/// into responses.
///
/// Holds only immutable state; a single dispatcher serves concurrent
/// requests without synchronization.
#[derive(Debug)]
pub struct Dispatcher {
    tree: Tree,
    registry: ContentRegistry,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher over a built tree and a configured registry.
    #[must_use]
    pub fn new(tree: Tree, registry: ContentRegistry, config: DispatchConfig) -> Self {
        Self {
            tree,
            registry,
            config,
        }
    }

    /// Dispatches one request.
    ///
    /// Never panics and never returns an error: every failure mode is
    /// converted into a response here.
    pub fn dispatch(&self, request: Request) -> Response {
        let (method, path, headers, body, parts) = request.into_pieces();

        let segments = match decode_path(&path) {
            Ok(segments) => segments,
            Err(err) => {
                return Response::error(StatusCode::BAD_REQUEST, "BAD_REQUEST", err.to_string())
            }
        };
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();

        match self.tree.lookup(&method, &refs) {
            Resolution::NotFound => {
                tracing::debug!(%method, %path, "no route");
                Response::error(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("no route for {path}"),
                )
            }
            Resolution::MethodNotAllowed { allowed } => {
                if method.trim().eq_ignore_ascii_case("OPTIONS") {
                    return Response::no_content().allow(&allowed);
                }
                tracing::debug!(%method, %path, ?allowed, "method not allowed");
                Response::error(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "METHOD_NOT_ALLOWED",
                    format!("{method} is not allowed for {path}"),
                )
                .allow(&allowed)
            }
            Resolution::Matched { endpoint, items } => {
                let body_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let body_data = body.map(|payload| Data::new(body_type, self.cap(payload)));

                let mut grouped: HashMap<String, Vec<Data>> = HashMap::new();
                for part in parts {
                    let (name, content_type, payload) = part.into_parts();
                    grouped
                        .entry(name)
                        .or_default()
                        .push(Data::new(content_type, self.cap(payload)));
                }

                match endpoint.call(&items, grouped, body_data, &self.registry) {
                    Ok(value) => self.encode(value, endpoint),
                    Err(err) => failure(&err),
                }
            }
        }
    }

    fn cap(&self, payload: Box<dyn Read + Send>) -> Box<dyn Read + Send> {
        match self.config.max_payload_bytes {
            Some(limit) => Box::new(LimitedReader::new(payload, limit)),
            None => payload,
        }
    }

    /// Serializes a handler result through the registry.
    ///
    /// Failures on this side are configuration bugs, not client faults, so
    /// they all surface as 500 envelopes.
    fn encode(&self, value: AnyValue, endpoint: &Endpoint) -> Response {
        let returns = endpoint.returns();
        if returns.is::<()>() {
            return Response::no_content();
        }
        match self.encode_value(value, returns, endpoint.content_type()) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, returns = %returns, "response encoding failed");
                Response::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "response encoding failed",
                )
            }
        }
    }

    /// A content type declared on the operation wins over the registry's
    /// binary/text fallback; a bare `base64` parameter on it wraps the
    /// encoded payload in Base64, mirroring the transparent decode on the
    /// input side.
    fn encode_value(
        &self,
        value: AnyValue,
        returns: &TypeDescriptor,
        declared: Option<&str>,
    ) -> Result<Response, ContentError> {
        let media = declared.map(MediaType::parse);
        let explicit = media.as_ref().map(MediaType::essence);
        let essence = self.registry.resolve(explicit, returns)?;
        let base64_wrapped = media.as_ref().is_some_and(MediaType::is_base64);

        let mut buffer = Vec::new();
        if base64_wrapped {
            let mut sink = EncoderWriter::new(&mut buffer, &BASE64);
            self.write_value(value, returns, &essence, &mut sink)?;
            sink.finish().map_err(ContentError::Io)?;
        } else {
            self.write_value(value, returns, &essence, &mut buffer)?;
        }

        let content_type = if base64_wrapped {
            format!("{essence}; base64")
        } else if self.registry.is_binary(returns) {
            essence
        } else {
            format!("{essence}; charset=utf-8")
        };
        Ok(Response::with_body(StatusCode::OK, &content_type, buffer))
    }

    fn write_value(
        &self,
        value: AnyValue,
        returns: &TypeDescriptor,
        essence: &str,
        out: &mut dyn Write,
    ) -> Result<(), ContentError> {
        if self.registry.is_binary(returns) {
            self.registry.byte_encoder(essence)?.encode(value, out)
        } else {
            self.registry.text_encoder(essence)?.encode(value, out)
        }
    }
}

/// Splits and percent-decodes the path. Segments must decode to UTF-8.
fn decode_path(path: &str) -> Result<Vec<String>, ClientError> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            percent_decode_str(segment)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .map_err(|_| {
                    ClientError::new(
                        ClientErrorKind::MalformedPath,
                        format!("path segment '{segment}' is not valid percent-encoded UTF-8"),
                    )
                })
        })
        .collect()
}

/// Maps a serve-time failure onto a response.
fn failure(err: &DispatchError) -> Response {
    match err {
        DispatchError::Client(client) => Response::error(
            client.status_code(),
            client_code(client.kind()),
            client.to_string(),
        ),
        DispatchError::Content(content) => {
            let status = content.input_status_code();
            if status.is_server_error() {
                tracing::error!(error = %content, "negotiation failure while reading input");
            }
            Response::error(status, content_code(status), content.to_string())
        }
        DispatchError::Call(call) => match call {
            talos_core::CallError::Application { status, body } => Response::with_body(
                *status,
                "text/plain; charset=utf-8",
                body.clone().into_bytes(),
            ),
            talos_core::CallError::Fatal(cause) => {
                tracing::error!(error = %cause, "endpoint call failed fatally");
                Response::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error",
                )
            }
        },
    }
}

fn client_code(kind: ClientErrorKind) -> &'static str {
    match kind {
        ClientErrorKind::MalformedItem => "MALFORMED_ITEM",
        ClientErrorKind::MissingBody => "MISSING_BODY",
        ClientErrorKind::UnexpectedBody => "UNEXPECTED_BODY",
        ClientErrorKind::MissingPart => "MISSING_PART",
        ClientErrorKind::UnexpectedPart => "UNEXPECTED_PART",
        ClientErrorKind::PartCountMismatch => "PART_COUNT_MISMATCH",
        ClientErrorKind::MalformedPayload => "MALFORMED_PAYLOAD",
        ClientErrorKind::MalformedPath => "MALFORMED_PATH",
    }
}

fn content_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        _ => "INTERNAL_ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Part;
    use std::io::Cursor;
    use talos_core::{CallError, ParserRegistry};
    use talos_router::{OperationDescriptor, ResourceDescriptor};

    fn payload(bytes: &[u8]) -> Box<dyn Read + Send> {
        Box::new(Cursor::new(bytes.to_vec()))
    }

    /// An album resource with a POST taking an integer item plus an "img"
    /// part, a unit-returning ping, and two GETs with declared response
    /// content types (one Base64-wrapped binary, one plain text).
    fn dispatcher(config: DispatchConfig) -> Dispatcher {
        let handler = |mut args: talos_core::Args| {
            let id: i64 = args.take(0)?;
            let img: String = args.take(1)?;
            if id < 0 {
                return Err(CallError::application(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "negative album id",
                ));
            }
            Ok(Box::new(format!("album {id} cover {img}")) as AnyValue)
        };
        let albums = ResourceDescriptor::new("album", "/albums").operation(
            OperationDescriptor::post(handler)
                .item::<i64>("id")
                .part::<String>("img")
                .returns::<String>(),
        );
        let ping = ResourceDescriptor::new("ping", "/ping").operation(
            OperationDescriptor::get(|_args| Ok(Box::new(()) as AnyValue)),
        );
        let cover = ResourceDescriptor::new("cover", "/cover").operation(
            OperationDescriptor::get(|_args| Ok(Box::new(vec![0_u8, 1, 2, 255]) as AnyValue))
                .returns::<Vec<u8>>()
                .content_type("application/octet-stream; base64"),
        );
        let report = ResourceDescriptor::new("report", "/report").operation(
            OperationDescriptor::get(|_args| Ok(Box::new(String::from("a,b\n1,2\n")) as AnyValue))
                .returns::<String>()
                .content_type("text/csv"),
        );
        let tree = Tree::builder()
            .resource(albums)
            .unwrap()
            .resource(ping)
            .unwrap()
            .resource(cover)
            .unwrap()
            .resource(report)
            .unwrap()
            .build(&ParserRegistry::new())
            .unwrap();
        let mut registry = ContentRegistry::new();
        registry.register_binary_type(TypeDescriptor::of::<Vec<u8>>());
        registry.alias_to_default_text("text/csv");
        Dispatcher::new(tree, registry, config)
    }

    fn album_request(id: &str, img: &[u8]) -> Request {
        Request::new("POST", format!("/albums/{id}"))
            .part(Part::new("img", Some("text/plain"), payload(img)))
    }

    #[test]
    fn test_matched_call_encodes_text() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(album_request("42", b"front.png"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.body(), b"album 42 cover front.png");
    }

    #[test]
    fn test_unit_return_is_no_content() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("GET", "/ping"));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_not_found() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("GET", "/tracks"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["code"], "NOT_FOUND");
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("DELETE", "/ping"));
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    }

    #[test]
    fn test_unmatched_options_reports_methods() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("OPTIONS", "/ping"));
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers().get(header::ALLOW).unwrap(), "GET");
    }

    #[test]
    fn test_malformed_item_is_bad_request() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(album_request("not-a-number", b"x"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["code"], "MALFORMED_ITEM");
    }

    #[test]
    fn test_missing_part_is_bad_request() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("POST", "/albums/42"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["code"], "MISSING_PART");
    }

    #[test]
    fn test_percent_decoded_item() {
        let dispatcher = dispatcher(DispatchConfig::default());
        // "%34%32" decodes to "42".
        let response = dispatcher.dispatch(
            Request::new("POST", "/albums/%34%32")
                .part(Part::new("img", Some("text/plain"), payload(b"x"))),
        );
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_invalid_percent_encoding() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("GET", "/albums/%ff"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unsupported_part_type_is_415() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(
            Request::new("POST", "/albums/42").part(Part::new(
                "img",
                Some("application/cbor"),
                payload(b"x"),
            )),
        );
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_payload_limit_is_413() {
        let dispatcher = dispatcher(DispatchConfig::default().with_max_payload_bytes(4));
        let response = dispatcher.dispatch(album_request("42", b"way past the cap"));
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let parsed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(parsed["code"], "PAYLOAD_TOO_LARGE");
    }

    #[test]
    fn test_base64_flagged_output_round_trips() {
        use base64::Engine;

        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("GET", "/cover"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/octet-stream; base64"
        );
        let decoded = BASE64.decode(response.body()).unwrap();
        assert_eq!(decoded, vec![0_u8, 1, 2, 255]);
    }

    #[test]
    fn test_declared_text_content_type_wins() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(Request::new("GET", "/report"));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv; charset=utf-8"
        );
        assert_eq!(response.body(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_application_error_passes_through() {
        let dispatcher = dispatcher(DispatchConfig::default());
        let response = dispatcher.dispatch(album_request("-1", b"x"));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body(), b"negative album id");
    }
}
