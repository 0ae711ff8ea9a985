//! # Talos
//!
//! **Routing, endpoint dispatch, and payload negotiation**
//!
//! Talos is the request-handling core a transport plugs into:
//!
//! - **Routing tree** – declared resource paths with nesting and trailing
//!   wildcards, resolved in a single pass with precise not-found versus
//!   method-not-allowed outcomes
//! - **Endpoint binding** – item/part/body/variadic parameters classified
//!   once at registration and converted per call through an explicit
//!   callable table
//! - **Content negotiation** – per-role codec registries, a binary type
//!   set, extension aliases, and binary/text fallbacks
//! - **Dispatch glue** – percent-decoded paths in, status/headers/body out,
//!   with every failure mode mapped to a response
//!
//! ## Quick Start
//!
//! ```rust
//! use talos::prelude::*;
//!
//! let albums = ResourceDescriptor::new("album", "/albums").operation(
//!     OperationDescriptor::get(|mut args| {
//!         let id: i64 = args.take(0)?;
//!         Ok(Box::new(format!("album {id}")) as _)
//!     })
//!     .item::<i64>("id")
//!     .returns::<String>(),
//! );
//!
//! let tree = Tree::builder()
//!     .resource(albums)?
//!     .build(&ParserRegistry::new())?;
//! let dispatcher = Dispatcher::new(tree, ContentRegistry::new(), DispatchConfig::default());
//!
//! let response = dispatcher.dispatch(Request::new("GET", "/albums/7"));
//! assert_eq!(response.body(), b"album 7");
//! # Ok::<(), talos::core::ConfigError>(())
//! ```

pub use talos_content as content;
pub use talos_core as core;
pub use talos_dispatch as dispatch;
pub use talos_router as router;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use talos::prelude::*;
/// ```
pub mod prelude {
    pub use talos_core::{
        AnyValue, Args, CallError, ClientError, ClientErrorKind, ConfigError, ContentError,
        DispatchError, ParserRegistry, TypeDescriptor,
    };

    pub use talos_content::{ContentRegistry, Data, OCTET_STREAM, TEXT_PLAIN};

    pub use talos_router::{
        Endpoint, Items, OperationDescriptor, ParamSpec, Resolution, ResourceDescriptor, Tree,
        TreeBuilder,
    };

    pub use talos_dispatch::{DispatchConfig, Dispatcher, Part, Request, Response};
}
