//! Core types for the Talos dispatch framework.
//!
//! This crate holds the vocabulary shared by every other Talos crate:
//!
//! - [`TypeDescriptor`] — an explicit type-identity value used wherever a
//!   declared parameter or return type must be compared exactly
//! - [`AnyValue`] / [`Args`] — dynamically typed argument and return values
//!   flowing between the dispatcher and resource handlers
//! - [`ParserRegistry`] — the table converting path-segment strings into
//!   typed item arguments
//! - the error taxonomy ([`ConfigError`], [`ClientError`], [`ContentError`],
//!   [`CallError`], [`DispatchError`]) separating registration-time
//!   failures from client input errors, negotiation failures, and
//!   application/fatal failures

mod error;
mod parser;
mod types;

pub use error::{
    CallError, ClientError, ClientErrorKind, CodecRole, ConfigError, ContentError, DispatchError,
};
pub use parser::{ParseFn, ParserRegistry};
pub use types::{AnyValue, Args, HandlerFn, TypeDescriptor};
