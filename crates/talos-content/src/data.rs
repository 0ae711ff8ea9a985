//! Single-shot payload wrapper.

use crate::limit::map_read_error;
use crate::media::MediaType;
use crate::registry::ContentRegistry;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::read::DecoderReader;
use std::io::Read;
use talos_core::{AnyValue, ContentError, TypeDescriptor};

/// A request body or multipart part: a content-type string paired with a
/// payload stream that has not been read yet.
///
/// A `Data` is produced once per body or part and consumed at most once;
/// [`Data::value`] takes `self`, so a second read is unrepresentable. The
/// internal guard still reports [`ContentError::AlreadyConsumed`] if the
/// payload was taken out from under it.
pub struct Data {
    content_type: Option<String>,
    payload: Option<Box<dyn Read + Send>>,
}

impl Data {
    /// Wraps an unread payload stream.
    #[must_use]
    pub fn new(content_type: Option<String>, payload: Box<dyn Read + Send>) -> Self {
        Self {
            content_type,
            payload: Some(payload),
        }
    }

    /// Returns the raw content-type string, if one was supplied.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Reads the payload and converts it into a value of the target type.
    ///
    /// The content type is resolved (explicit wins, else the registry's
    /// fallback for the target's binary/text classification). A bare
    /// `base64` content-type parameter transparently un-Base64s the stream
    /// before the codec sees it. Binary targets go through the byte-read
    /// codec; text targets are charset-decoded and go through the
    /// text-read codec.
    pub fn value(
        self,
        registry: &ContentRegistry,
        target: &TypeDescriptor,
    ) -> Result<AnyValue, ContentError> {
        let payload = self.payload.ok_or(ContentError::AlreadyConsumed)?;
        let media = self.content_type.as_deref().map(MediaType::parse);

        let explicit = media.as_ref().map(MediaType::essence);
        let resolved = registry.resolve(explicit, target)?;

        let base64_wrapped = media.as_ref().is_some_and(MediaType::is_base64);
        let payload: Box<dyn Read + Send> = if base64_wrapped {
            Box::new(DecoderReader::new(payload, &BASE64))
        } else {
            payload
        };

        if registry.is_binary(target) {
            return registry.byte_decoder(&resolved)?.decode(payload, target);
        }

        let text = decode_text(payload, media.as_ref().and_then(MediaType::charset))?;
        registry.text_decoder(&resolved)?.decode(text, target)
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("content_type", &self.content_type)
            .field("consumed", &self.payload.is_none())
            .finish()
    }
}

/// Reads the whole payload and decodes it with the declared charset.
///
/// Supported charsets: `utf-8` (default), `us-ascii`, `iso-8859-1`/`latin-1`.
fn decode_text(
    mut payload: Box<dyn Read + Send>,
    charset: Option<&str>,
) -> Result<String, ContentError> {
    let mut bytes = Vec::new();
    payload.read_to_end(&mut bytes).map_err(map_read_error)?;

    match charset.unwrap_or("utf-8") {
        "utf-8" | "utf8" => String::from_utf8(bytes).map_err(|e| ContentError::Malformed {
            message: format!("invalid UTF-8 payload: {e}"),
        }),
        "us-ascii" | "ascii" => {
            if bytes.is_ascii() {
                // ASCII is a UTF-8 subset; the check above makes this safe.
                String::from_utf8(bytes).map_err(|e| ContentError::Malformed {
                    message: e.to_string(),
                })
            } else {
                Err(ContentError::Malformed {
                    message: "non-ASCII byte in us-ascii payload".to_string(),
                })
            }
        }
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(bytes.iter().map(|&b| char::from(b)).collect())
        }
        other => Err(ContentError::UnsupportedCharset {
            charset: other.to_string(),
        }),
    }
}
