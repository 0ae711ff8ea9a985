//! Dispatch glue for Talos.
//!
//! The transport hands a [`Request`] to the [`Dispatcher`], which decodes
//! the path, resolves the routing tree, binds and invokes the endpoint, and
//! encodes the outcome into a [`Response`]. Every failure mode ends up as a
//! response; nothing panics past this boundary.

pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod request;
pub mod response;

pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use envelope::ErrorBody;
pub use request::{Part, Request};
pub use response::Response;
