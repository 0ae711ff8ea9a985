//! Endpoint parameter binding and invocation.
//!
//! At registration each declared parameter is classified into a binding
//! plan: positional path items, named multipart parts, a whole-body slot,
//! or a trailing variadic item. At call time the plan converts raw
//! strings and payloads into typed arguments and invokes the handler. Only
//! application and fatal failures may cross the call boundary; everything
//! the client got wrong is reported as a recoverable client error first.

use crate::items::Items;
use indexmap::IndexMap;
use std::collections::HashMap;
use talos_content::{ContentRegistry, Data};
use talos_core::{
    AnyValue, Args, CallError, ClientError, ClientErrorKind, ConfigError, DispatchError,
    HandlerFn, ParseFn, ParserRegistry, TypeDescriptor,
};

/// One declared parameter of a resource operation.
#[derive(Clone)]
pub enum ParamSpec {
    /// A path item bound positionally and parsed from its segment string.
    Item {
        /// Diagnostic name of the parameter.
        name: String,
        /// Declared type; must have a registered item parser.
        ty: TypeDescriptor,
    },
    /// A named multipart part converted through the content registry.
    Part {
        /// The part name on the wire.
        name: String,
        /// Declared type of the converted part value.
        ty: TypeDescriptor,
    },
    /// The whole request body converted through the content registry.
    Body {
        /// Declared type of the converted body value.
        ty: TypeDescriptor,
    },
    /// A trailing variadic item consuming the remaining path segments.
    Variadic {
        /// Diagnostic name of the parameter.
        name: String,
        /// Element type; must have a registered item parser.
        element: TypeDescriptor,
    },
}

impl ParamSpec {
    /// Declares a path item parameter of type `T`.
    #[must_use]
    pub fn item<T: 'static>(name: impl Into<String>) -> Self {
        Self::Item {
            name: name.into(),
            ty: TypeDescriptor::of::<T>(),
        }
    }

    /// Declares a multipart part parameter of type `T`.
    #[must_use]
    pub fn part<T: 'static>(name: impl Into<String>) -> Self {
        Self::Part {
            name: name.into(),
            ty: TypeDescriptor::of::<T>(),
        }
    }

    /// Declares the body parameter of type `T`.
    #[must_use]
    pub fn body<T: 'static>() -> Self {
        Self::Body {
            ty: TypeDescriptor::of::<T>(),
        }
    }

    /// Declares a trailing variadic parameter with element type `T`.
    #[must_use]
    pub fn variadic<T: 'static>(name: impl Into<String>) -> Self {
        Self::Variadic {
            name: name.into(),
            element: TypeDescriptor::of::<T>(),
        }
    }
}

struct ItemSlot {
    index: usize,
    name: String,
    parse: ParseFn,
}

struct PartSlot {
    index: usize,
    ty: TypeDescriptor,
}

struct VariadicSlot {
    index: usize,
    name: String,
    parse: ParseFn,
}

/// One routable `(path, method)` target with its fixed binding plan.
///
/// Created once at registration, invoked many times, never mutated after
/// creation. Arguments are assembled into a fresh vector per call, so
/// concurrent invocations of the same endpoint share no mutable state.
pub struct Endpoint {
    resource: String,
    method: String,
    items: Vec<ItemSlot>,
    parts: IndexMap<String, Vec<PartSlot>>,
    body: Option<(usize, TypeDescriptor)>,
    variadic: Option<VariadicSlot>,
    arity: usize,
    distance: usize,
    reach: usize,
    returns: TypeDescriptor,
    content_type: Option<String>,
    handler: HandlerFn,
}

impl Endpoint {
    /// Classifies declared parameters into a binding plan.
    ///
    /// `distance` is the number of wildcard segments the resource's nesting
    /// prefix already consumes; the operation must declare at least that
    /// many item parameters, and `reach` is whatever it declares beyond
    /// that.
    pub(crate) fn bind(
        resource: &str,
        method: &str,
        params: Vec<ParamSpec>,
        returns: TypeDescriptor,
        content_type: Option<String>,
        handler: HandlerFn,
        distance: usize,
        parsers: &ParserRegistry,
    ) -> Result<Self, ConfigError> {
        let arity = params.len();
        let mut items = Vec::new();
        let mut parts: IndexMap<String, Vec<PartSlot>> = IndexMap::new();
        let mut body = None;
        let mut variadic = None;

        for (index, param) in params.into_iter().enumerate() {
            match param {
                ParamSpec::Item { name, ty } => {
                    let parse =
                        parsers
                            .lookup(&ty)
                            .ok_or_else(|| ConfigError::NoItemParser {
                                param: name.clone(),
                                type_name: ty.name().to_string(),
                            })?;
                    items.push(ItemSlot { index, name, parse });
                }
                ParamSpec::Part { name, ty } => {
                    parts.entry(name).or_default().push(PartSlot { index, ty });
                }
                ParamSpec::Body { ty } => {
                    if body.is_some() {
                        return Err(ConfigError::MultipleBodies {
                            resource: resource.to_string(),
                            method: method.to_string(),
                        });
                    }
                    body = Some((index, ty));
                }
                ParamSpec::Variadic { name, element } => {
                    if index + 1 != arity {
                        return Err(ConfigError::VariadicNotLast {
                            resource: resource.to_string(),
                            method: method.to_string(),
                            param: name,
                        });
                    }
                    let parse =
                        parsers
                            .lookup(&element)
                            .ok_or_else(|| ConfigError::NoItemParser {
                                param: name.clone(),
                                type_name: element.name().to_string(),
                            })?;
                    variadic = Some(VariadicSlot { index, name, parse });
                }
            }
        }

        if !parts.is_empty() && body.is_some() {
            return Err(ConfigError::PartsWithBody {
                resource: resource.to_string(),
                method: method.to_string(),
            });
        }
        if items.len() < distance {
            return Err(ConfigError::NotEnoughItems {
                resource: resource.to_string(),
                method: method.to_string(),
                declared: items.len(),
                required: distance,
            });
        }
        let reach = items.len() - distance;

        Ok(Self {
            resource: resource.to_string(),
            method: method.to_ascii_uppercase(),
            items,
            parts,
            body,
            variadic,
            arity,
            distance,
            reach,
            returns,
            content_type,
            handler,
        })
    }

    /// Returns the owning resource's name.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the uppercase method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the wildcard levels this endpoint adds below its resource
    /// path.
    #[must_use]
    pub fn reach(&self) -> usize {
        self.reach
    }

    /// Returns the wildcard levels consumed by the nesting prefix.
    #[must_use]
    pub fn distance(&self) -> usize {
        self.distance
    }

    /// Returns true if the endpoint consumes trailing segments greedily.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// Returns the declared return type.
    #[must_use]
    pub fn returns(&self) -> &TypeDescriptor {
        &self.returns
    }

    /// Returns the declared response content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Binds the captured items, parts, and body to typed arguments and
    /// invokes the handler.
    pub fn call(
        &self,
        items: &Items,
        mut parts: HashMap<String, Vec<Data>>,
        body: Option<Data>,
        registry: &ContentRegistry,
    ) -> Result<AnyValue, DispatchError> {
        let mut args: Vec<Option<AnyValue>> = (0..self.arity).map(|_| None).collect();

        for (position, slot) in self.items.iter().enumerate() {
            let raw = items.get(position).ok_or_else(|| {
                CallError::fatal(anyhow::anyhow!(
                    "lookup produced {} item(s) but the binding plan expects {}",
                    items.len(),
                    self.items.len()
                ))
            })?;
            let value = (slot.parse)(raw)
                .map_err(|detail| ClientError::malformed_item(&slot.name, detail))?;
            args[slot.index] = Some(value);
        }

        if let Some(slot) = &self.variadic {
            let mut elements: Vec<AnyValue> = Vec::new();
            for raw in items.iter().skip(self.items.len()) {
                let value = (slot.parse)(raw)
                    .map_err(|detail| ClientError::malformed_item(&slot.name, detail))?;
                elements.push(value);
            }
            args[slot.index] = Some(Box::new(elements));
        }

        if self.parts.is_empty() {
            if let Some(name) = parts.keys().next() {
                return Err(ClientError::new(
                    ClientErrorKind::UnexpectedPart,
                    format!("unexpected part '{name}': endpoint declares no part parameters"),
                )
                .into());
            }
            match (&self.body, body) {
                (Some((index, ty)), Some(data)) => {
                    args[*index] = Some(data.value(registry, ty)?);
                }
                (Some(_), None) => {
                    return Err(ClientError::new(
                        ClientErrorKind::MissingBody,
                        "a request body is required",
                    )
                    .into());
                }
                (None, Some(_)) => {
                    return Err(ClientError::new(
                        ClientErrorKind::UnexpectedBody,
                        "no request body is expected",
                    )
                    .into());
                }
                (None, None) => {}
            }
        } else {
            if body.is_some() {
                return Err(ClientError::new(
                    ClientErrorKind::UnexpectedBody,
                    "a plain body was supplied to a multipart endpoint",
                )
                .into());
            }
            for (name, slots) in &self.parts {
                let supplied = parts.remove(name).unwrap_or_default();
                if supplied.is_empty() {
                    return Err(ClientError::new(
                        ClientErrorKind::MissingPart,
                        format!("missing required part '{name}'"),
                    )
                    .into());
                }
                if supplied.len() != slots.len() {
                    return Err(ClientError::new(
                        ClientErrorKind::PartCountMismatch,
                        format!(
                            "part '{name}' expects {} occurrence(s), got {}",
                            slots.len(),
                            supplied.len()
                        ),
                    )
                    .into());
                }
                for (slot, data) in slots.iter().zip(supplied) {
                    args[slot.index] = Some(data.value(registry, &slot.ty)?);
                }
            }
            if let Some(name) = parts.keys().next() {
                return Err(ClientError::new(
                    ClientErrorKind::UnexpectedPart,
                    format!("unexpected part '{name}'"),
                )
                .into());
            }
        }

        let values = args
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                value.ok_or_else(|| {
                    CallError::fatal(anyhow::anyhow!("argument slot {index} was never bound"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        (self.handler)(Args::new(values)).map_err(DispatchError::Call)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("resource", &self.resource)
            .field("method", &self.method)
            .field("items", &self.items.len())
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .field("body", &self.body.is_some())
            .field("variadic", &self.variadic.is_some())
            .field("distance", &self.distance)
            .field("reach", &self.reach)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use talos_core::ClientErrorKind;

    fn parsers() -> ParserRegistry {
        ParserRegistry::new()
    }

    fn unit_handler() -> HandlerFn {
        Arc::new(|_args| Ok(Box::new(()) as AnyValue))
    }

    fn bind(
        params: Vec<ParamSpec>,
        distance: usize,
        handler: HandlerFn,
    ) -> Result<Endpoint, ConfigError> {
        Endpoint::bind(
            "test",
            "GET",
            params,
            TypeDescriptor::of::<()>(),
            None,
            handler,
            distance,
            &parsers(),
        )
    }

    fn items(values: &[&str]) -> Items {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn text_data(text: &str) -> Data {
        Data::new(None, Box::new(Cursor::new(text.as_bytes().to_vec())))
    }

    #[test]
    fn test_bind_items_and_reach() {
        let endpoint = bind(
            vec![ParamSpec::item::<i32>("id"), ParamSpec::item::<f64>("score")],
            1,
            unit_handler(),
        )
        .unwrap();
        assert_eq!(endpoint.distance(), 1);
        assert_eq!(endpoint.reach(), 1);
        assert!(!endpoint.is_variadic());
    }

    #[test]
    fn test_bind_too_few_items_for_distance() {
        let err = bind(vec![ParamSpec::item::<i32>("id")], 2, unit_handler()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotEnoughItems {
                declared: 1,
                required: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_bind_rejects_parts_with_body() {
        let err = bind(
            vec![ParamSpec::part::<String>("doc"), ParamSpec::body::<String>()],
            0,
            unit_handler(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::PartsWithBody { .. }));
    }

    #[test]
    fn test_bind_rejects_multiple_bodies() {
        let err = bind(
            vec![ParamSpec::body::<String>(), ParamSpec::body::<String>()],
            0,
            unit_handler(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MultipleBodies { .. }));
    }

    #[test]
    fn test_bind_rejects_variadic_not_last() {
        let err = bind(
            vec![
                ParamSpec::variadic::<String>("rest"),
                ParamSpec::item::<i32>("id"),
            ],
            0,
            unit_handler(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::VariadicNotLast { .. }));
    }

    #[test]
    fn test_bind_rejects_unparseable_item_type() {
        struct Widget;
        let err = bind(vec![ParamSpec::item::<Widget>("w")], 0, unit_handler()).unwrap_err();
        assert!(matches!(err, ConfigError::NoItemParser { .. }));
    }

    #[test]
    fn test_call_binds_typed_items() {
        let handler: HandlerFn = Arc::new(|mut args| {
            assert_eq!(args.take::<i32>(0)?, 1);
            assert!((args.take::<f64>(1)? - 2.5).abs() < f64::EPSILON);
            Ok(Box::new(()) as AnyValue)
        });
        let endpoint = bind(
            vec![ParamSpec::item::<i32>("n"), ParamSpec::item::<f64>("x")],
            0,
            handler,
        )
        .unwrap();

        let registry = ContentRegistry::new();
        endpoint
            .call(&items(&["1", "2.5"]), HashMap::new(), None, &registry)
            .unwrap();
    }

    #[test]
    fn test_call_malformed_item_is_client_error() {
        let endpoint = bind(
            vec![ParamSpec::item::<i32>("n"), ParamSpec::item::<f64>("x")],
            0,
            unit_handler(),
        )
        .unwrap();

        let registry = ContentRegistry::new();
        let err = endpoint
            .call(&items(&["x", "2.5"]), HashMap::new(), None, &registry)
            .unwrap_err();
        match err {
            DispatchError::Client(client) => {
                assert_eq!(client.kind(), ClientErrorKind::MalformedItem);
                assert!(client.to_string().contains("'n'"));
            }
            other => panic!("expected client error, got {other}"),
        }
    }

    #[test]
    fn test_call_missing_body() {
        let endpoint = bind(vec![ParamSpec::body::<String>()], 0, unit_handler()).unwrap();
        let registry = ContentRegistry::new();
        let err = endpoint
            .call(&Items::new(), HashMap::new(), None, &registry)
            .unwrap_err();
        match err {
            DispatchError::Client(client) => {
                assert_eq!(client.kind(), ClientErrorKind::MissingBody);
            }
            other => panic!("expected client error, got {other}"),
        }
    }

    #[test]
    fn test_call_unexpected_body() {
        let endpoint = bind(vec![], 0, unit_handler()).unwrap();
        let registry = ContentRegistry::new();
        let err = endpoint
            .call(&Items::new(), HashMap::new(), Some(text_data("x")), &registry)
            .unwrap_err();
        match err {
            DispatchError::Client(client) => {
                assert_eq!(client.kind(), ClientErrorKind::UnexpectedBody);
            }
            other => panic!("expected client error, got {other}"),
        }
    }

    #[test]
    fn test_call_unexpected_parts() {
        let endpoint = bind(vec![], 0, unit_handler()).unwrap();
        let registry = ContentRegistry::new();
        let mut parts = HashMap::new();
        parts.insert("img".to_string(), vec![text_data("x")]);
        let err = endpoint
            .call(&Items::new(), parts, None, &registry)
            .unwrap_err();
        match err {
            DispatchError::Client(client) => {
                assert_eq!(client.kind(), ClientErrorKind::UnexpectedPart);
            }
            other => panic!("expected client error, got {other}"),
        }
    }

    #[test]
    fn test_call_part_binding() {
        let handler: HandlerFn = Arc::new(|mut args| {
            assert_eq!(args.take::<String>(0)?, "hello");
            Ok(Box::new(()) as AnyValue)
        });
        let endpoint = bind(vec![ParamSpec::part::<String>("doc")], 0, handler).unwrap();
        let registry = ContentRegistry::new();
        let mut parts = HashMap::new();
        parts.insert("doc".to_string(), vec![text_data("hello")]);
        endpoint.call(&Items::new(), parts, None, &registry).unwrap();
    }

    #[test]
    fn test_call_part_count_mismatch() {
        let endpoint = bind(vec![ParamSpec::part::<String>("doc")], 0, unit_handler()).unwrap();
        let registry = ContentRegistry::new();
        let mut parts = HashMap::new();
        parts.insert("doc".to_string(), vec![text_data("a"), text_data("b")]);
        let err = endpoint
            .call(&Items::new(), parts, None, &registry)
            .unwrap_err();
        match err {
            DispatchError::Client(client) => {
                assert_eq!(client.kind(), ClientErrorKind::PartCountMismatch);
            }
            other => panic!("expected client error, got {other}"),
        }
    }

    #[test]
    fn test_call_missing_part() {
        let endpoint = bind(vec![ParamSpec::part::<String>("doc")], 0, unit_handler()).unwrap();
        let registry = ContentRegistry::new();
        let err = endpoint
            .call(&Items::new(), HashMap::new(), None, &registry)
            .unwrap_err();
        match err {
            DispatchError::Client(client) => {
                assert_eq!(client.kind(), ClientErrorKind::MissingPart);
            }
            other => panic!("expected client error, got {other}"),
        }
    }

    #[test]
    fn test_call_variadic_greedy() {
        let handler: HandlerFn = Arc::new(|mut args| {
            assert_eq!(args.take::<i32>(0)?, 1);
            assert_eq!(args.take_variadic::<String>(1)?, vec!["a", "b", "c"]);
            Ok(Box::new(()) as AnyValue)
        });
        let endpoint = bind(
            vec![
                ParamSpec::item::<i32>("id"),
                ParamSpec::variadic::<String>("rest"),
            ],
            0,
            handler,
        )
        .unwrap();
        let registry = ContentRegistry::new();
        endpoint
            .call(&items(&["1", "a", "b", "c"]), HashMap::new(), None, &registry)
            .unwrap();
    }

    #[test]
    fn test_call_propagates_application_error() {
        let handler: HandlerFn = Arc::new(|_args| {
            Err(CallError::application(
                http_status_teapot(),
                "short and stout",
            ))
        });
        let endpoint = bind(vec![], 0, handler).unwrap();
        let registry = ContentRegistry::new();
        let err = endpoint
            .call(&Items::new(), HashMap::new(), None, &registry)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Call(CallError::Application { .. })
        ));
    }

    fn http_status_teapot() -> http::StatusCode {
        http::StatusCode::IM_A_TEAPOT
    }
}
