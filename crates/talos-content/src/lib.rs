//! Content negotiation and payload handling for Talos.
//!
//! This crate maps content-type strings to codecs, decides whether a
//! declared type is transformed byte-wise or text-wise, and wraps raw
//! request payloads so they are read exactly once, charset-decoded, and
//! transparently un-Base64'd when the wire says so.
//!
//! # Overview
//!
//! - [`MediaType`] — the `type/subtype; params` grammar, including the
//!   `charset=` parameter and the bare `base64` token
//! - [`ByteDecoder`]/[`ByteEncoder`]/[`TextDecoder`]/[`TextEncoder`] — the
//!   four codec roles
//! - [`ContentRegistry`] — content-type → codec maps per role, the binary
//!   type set, extension aliases, and the binary/text fallback types
//! - [`Data`] — a single-shot payload: content type + unread stream
//! - [`LimitedReader`] — byte-capped reading that fails fast instead of
//!   buffering unboundedly

mod codec;
mod data;
mod limit;
mod media;
mod registry;

pub use codec::{ByteDecoder, ByteEncoder, RawByteCodec, PlainTextCodec, TextDecoder, TextEncoder};
pub use data::Data;
pub use limit::{map_read_error, LimitExceeded, LimitedReader};
pub use media::{normalize, MediaType};
pub use registry::{ContentRegistry, OCTET_STREAM, TEXT_PLAIN};
