//! Codec role traits and the default pass-through codecs.
//!
//! Four roles exist: byte-read, byte-write, text-read, text-write. Byte
//! codecs see the raw payload stream; text codecs see payloads that have
//! already been charset-decoded into a `String`, and write UTF-8.

use crate::limit::map_read_error;
use std::io::{self, Read, Write};
use talos_core::{AnyValue, ContentError, TypeDescriptor};

/// Decodes a byte payload into a value of the requested type.
pub trait ByteDecoder: Send + Sync + std::fmt::Debug {
    /// Consumes the payload stream and produces the target value.
    fn decode(
        &self,
        payload: Box<dyn Read + Send>,
        target: &TypeDescriptor,
    ) -> Result<AnyValue, ContentError>;
}

/// Encodes a value into a byte sink.
pub trait ByteEncoder: Send + Sync {
    /// Writes the value's byte representation.
    fn encode(&self, value: AnyValue, out: &mut dyn Write) -> Result<(), ContentError>;
}

/// Decodes a charset-decoded text payload into a value of the requested type.
pub trait TextDecoder: Send + Sync {
    /// Produces the target value from the decoded text.
    fn decode(&self, text: String, target: &TypeDescriptor) -> Result<AnyValue, ContentError>;
}

/// Encodes a value as UTF-8 text.
pub trait TextEncoder: Send + Sync {
    /// Writes the value's text representation.
    fn encode(&self, value: AnyValue, out: &mut dyn Write) -> Result<(), ContentError>;
}

fn unexpected(ty: &TypeDescriptor) -> ContentError {
    ContentError::Unresolvable {
        type_name: ty.name().to_string(),
    }
}

/// The default pass-through byte codec.
///
/// Decodes into `Vec<u8>` (fully read) or hands the still-open stream over
/// as a `Box<dyn Read + Send>`; encodes `Vec<u8>` and open streams. It is
/// pre-registered for `application/octet-stream` and is the target of
/// "alias to default" registrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawByteCodec;

impl ByteDecoder for RawByteCodec {
    fn decode(
        &self,
        mut payload: Box<dyn Read + Send>,
        target: &TypeDescriptor,
    ) -> Result<AnyValue, ContentError> {
        if target.is::<Vec<u8>>() {
            let mut bytes = Vec::new();
            payload.read_to_end(&mut bytes).map_err(map_read_error)?;
            return Ok(Box::new(bytes));
        }
        if target.is::<Box<dyn Read + Send>>() {
            return Ok(Box::new(payload));
        }
        Err(unexpected(target))
    }
}

impl ByteEncoder for RawByteCodec {
    fn encode(&self, value: AnyValue, out: &mut dyn Write) -> Result<(), ContentError> {
        let value = match value.downcast::<Vec<u8>>() {
            Ok(bytes) => {
                out.write_all(&bytes).map_err(ContentError::Io)?;
                return Ok(());
            }
            Err(other) => other,
        };
        match value.downcast::<Box<dyn Read + Send>>() {
            Ok(mut reader) => {
                io::copy(&mut reader, out).map_err(map_read_error)?;
                Ok(())
            }
            Err(_) => Err(ContentError::Unresolvable {
                type_name: "non-byte value".to_string(),
            }),
        }
    }
}

/// The default pass-through text codec.
///
/// Decodes into `String`; encodes `String` as UTF-8. Pre-registered for
/// `text/plain`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextCodec;

impl TextDecoder for PlainTextCodec {
    fn decode(&self, text: String, target: &TypeDescriptor) -> Result<AnyValue, ContentError> {
        if target.is::<String>() {
            return Ok(Box::new(text));
        }
        Err(unexpected(target))
    }
}

impl TextEncoder for PlainTextCodec {
    fn encode(&self, value: AnyValue, out: &mut dyn Write) -> Result<(), ContentError> {
        match value.downcast::<String>() {
            Ok(text) => {
                out.write_all(text.as_bytes()).map_err(ContentError::Io)?;
                Ok(())
            }
            Err(_) => Err(ContentError::Unresolvable {
                type_name: "non-text value".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_decode_to_vec() {
        let value = RawByteCodec
            .decode(Box::new(&b"abc"[..]), &TypeDescriptor::of::<Vec<u8>>())
            .unwrap();
        assert_eq!(*value.downcast::<Vec<u8>>().unwrap(), b"abc".to_vec());
    }

    #[test]
    fn test_raw_decode_to_stream() {
        let value = RawByteCodec
            .decode(
                Box::new(&b"abc"[..]),
                &TypeDescriptor::of::<Box<dyn Read + Send>>(),
            )
            .unwrap();
        let mut reader = *value.downcast::<Box<dyn Read + Send>>().unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_raw_decode_unexpected_target() {
        let result = RawByteCodec.decode(Box::new(&b"abc"[..]), &TypeDescriptor::of::<String>());
        assert!(matches!(result, Err(ContentError::Unresolvable { .. })));
    }

    #[test]
    fn test_raw_encode_vec() {
        let mut out = Vec::new();
        RawByteCodec
            .encode(Box::new(b"abc".to_vec()), &mut out)
            .unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_raw_encode_stream() {
        let reader: Box<dyn Read + Send> = Box::new(&b"abc"[..]);
        let mut out = Vec::new();
        RawByteCodec.encode(Box::new(reader), &mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    #[test]
    fn test_text_round() {
        let value = PlainTextCodec
            .decode("hi".to_string(), &TypeDescriptor::of::<String>())
            .unwrap();
        let mut out = Vec::new();
        PlainTextCodec.encode(value, &mut out).unwrap();
        assert_eq!(out, b"hi");
    }

    #[test]
    fn test_text_decode_unexpected_target() {
        let result = PlainTextCodec.decode("hi".to_string(), &TypeDescriptor::of::<i32>());
        assert!(matches!(result, Err(ContentError::Unresolvable { .. })));
    }
}
