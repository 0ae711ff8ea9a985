//! The content-negotiation registry.

use crate::codec::{ByteDecoder, ByteEncoder, PlainTextCodec, RawByteCodec, TextDecoder, TextEncoder};
use crate::media::normalize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use talos_core::{CodecRole, ConfigError, ContentError, TypeDescriptor};

/// Built-in default content type for binary values.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Built-in default content type for text values.
pub const TEXT_PLAIN: &str = "text/plain";

/// Content-type → codec mappings plus the negotiation policy around them.
///
/// Holds one map per codec role, the set of types considered binary (exact
/// type identity, no subtype inference), per-extension content-type
/// aliases, and the two fallback content types used when no content type is
/// explicit. All keys are normalized essences.
///
/// Mutated only during configuration; shared read-only (behind an `Arc`)
/// while serving.
///
/// # Example
///
/// ```rust
/// use talos_content::{ContentRegistry, OCTET_STREAM};
/// use talos_core::TypeDescriptor;
///
/// let mut registry = ContentRegistry::new();
/// registry.register_binary_type(TypeDescriptor::of::<Vec<u8>>());
/// let resolved = registry
///     .resolve(None, &TypeDescriptor::of::<Vec<u8>>())
///     .unwrap();
/// assert_eq!(resolved, OCTET_STREAM);
/// ```
pub struct ContentRegistry {
    byte_decoders: HashMap<String, Arc<dyn ByteDecoder>>,
    byte_encoders: HashMap<String, Arc<dyn ByteEncoder>>,
    text_decoders: HashMap<String, Arc<dyn TextDecoder>>,
    text_encoders: HashMap<String, Arc<dyn TextEncoder>>,
    binary_types: HashSet<TypeDescriptor>,
    extensions: HashMap<String, String>,
    fallback_binary: Option<String>,
    fallback_text: Option<String>,
}

impl Default for ContentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRegistry {
    /// Creates a registry with the default pass-through codecs registered
    /// under [`OCTET_STREAM`] and [`TEXT_PLAIN`].
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            byte_decoders: HashMap::new(),
            byte_encoders: HashMap::new(),
            text_decoders: HashMap::new(),
            text_encoders: HashMap::new(),
            binary_types: HashSet::new(),
            extensions: HashMap::new(),
            fallback_binary: None,
            fallback_text: None,
        };
        registry.alias_to_default_bytes(OCTET_STREAM);
        registry.alias_to_default_text(TEXT_PLAIN);
        registry
    }

    /// Registers a byte-read codec for a content type.
    pub fn register_byte_decoder(&mut self, content_type: &str, codec: Arc<dyn ByteDecoder>) {
        self.byte_decoders.insert(normalize(content_type), codec);
    }

    /// Registers a byte-write codec for a content type.
    pub fn register_byte_encoder(&mut self, content_type: &str, codec: Arc<dyn ByteEncoder>) {
        self.byte_encoders.insert(normalize(content_type), codec);
    }

    /// Registers a text-read codec for a content type.
    pub fn register_text_decoder(&mut self, content_type: &str, codec: Arc<dyn TextDecoder>) {
        self.text_decoders.insert(normalize(content_type), codec);
    }

    /// Registers a text-write codec for a content type.
    pub fn register_text_encoder(&mut self, content_type: &str, codec: Arc<dyn TextEncoder>) {
        self.text_encoders.insert(normalize(content_type), codec);
    }

    /// Maps a content type onto the default pass-through byte codec pair.
    pub fn alias_to_default_bytes(&mut self, content_type: &str) {
        self.register_byte_decoder(content_type, Arc::new(RawByteCodec));
        self.register_byte_encoder(content_type, Arc::new(RawByteCodec));
    }

    /// Maps a content type onto the default pass-through text codec pair.
    pub fn alias_to_default_text(&mut self, content_type: &str) {
        self.register_text_decoder(content_type, Arc::new(PlainTextCodec));
        self.register_text_encoder(content_type, Arc::new(PlainTextCodec));
    }

    /// Declares a type as binary.
    ///
    /// Matching is by exact type identity; registering `Vec<u8>` does not
    /// make any other type binary.
    pub fn register_binary_type(&mut self, ty: TypeDescriptor) {
        self.binary_types.insert(ty);
    }

    /// Returns true if the type is registered as binary.
    #[must_use]
    pub fn is_binary(&self, ty: &TypeDescriptor) -> bool {
        self.binary_types.contains(ty)
    }

    /// Sets the fallback content type for binary values.
    ///
    /// Rejected if the content type has no codec in any role.
    pub fn set_fallback_binary(&mut self, content_type: &str) -> Result<(), ConfigError> {
        let essence = normalize(content_type);
        self.require_codec(&essence)?;
        self.fallback_binary = Some(essence);
        Ok(())
    }

    /// Sets the fallback content type for text values.
    ///
    /// Rejected if the content type has no codec in any role.
    pub fn set_fallback_text(&mut self, content_type: &str) -> Result<(), ConfigError> {
        let essence = normalize(content_type);
        self.require_codec(&essence)?;
        self.fallback_text = Some(essence);
        Ok(())
    }

    /// Registers a file extension alias for an existing content type.
    pub fn register_extension(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), ConfigError> {
        let essence = normalize(content_type);
        self.require_codec(&essence)?;
        self.extensions
            .insert(extension.trim().to_ascii_lowercase(), essence);
        Ok(())
    }

    /// Returns the content type registered for a file extension.
    #[must_use]
    pub fn by_extension(&self, extension: &str) -> Option<&str> {
        self.extensions
            .get(&extension.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resolves the content type a value of `ty` should use.
    ///
    /// An explicit content type (already on the wire) wins verbatim, after
    /// normalization. Otherwise binary types use the registered binary
    /// fallback, or [`OCTET_STREAM`] if a codec exists for it; text types
    /// use the registered text fallback or [`TEXT_PLAIN`]. Failure here is
    /// configuration-shaped, not a 415.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        ty: &TypeDescriptor,
    ) -> Result<String, ContentError> {
        if let Some(raw) = explicit {
            return Ok(normalize(raw));
        }
        if self.is_binary(ty) {
            if let Some(fallback) = &self.fallback_binary {
                return Ok(fallback.clone());
            }
            if self.has_codec(OCTET_STREAM) {
                return Ok(OCTET_STREAM.to_string());
            }
            return Err(ContentError::Unresolvable {
                type_name: ty.name().to_string(),
            });
        }
        Ok(self
            .fallback_text
            .clone()
            .unwrap_or_else(|| TEXT_PLAIN.to_string()))
    }

    /// Looks up the byte-read codec for a content type.
    pub fn byte_decoder(&self, content_type: &str) -> Result<Arc<dyn ByteDecoder>, ContentError> {
        let essence = normalize(content_type);
        self.byte_decoders
            .get(&essence)
            .cloned()
            .ok_or(ContentError::UnsupportedType {
                content_type: essence,
                role: CodecRole::ByteRead,
            })
    }

    /// Looks up the byte-write codec for a content type.
    pub fn byte_encoder(&self, content_type: &str) -> Result<Arc<dyn ByteEncoder>, ContentError> {
        let essence = normalize(content_type);
        self.byte_encoders
            .get(&essence)
            .cloned()
            .ok_or(ContentError::UnsupportedType {
                content_type: essence,
                role: CodecRole::ByteWrite,
            })
    }

    /// Looks up the text-read codec for a content type.
    pub fn text_decoder(&self, content_type: &str) -> Result<Arc<dyn TextDecoder>, ContentError> {
        let essence = normalize(content_type);
        self.text_decoders
            .get(&essence)
            .cloned()
            .ok_or(ContentError::UnsupportedType {
                content_type: essence,
                role: CodecRole::TextRead,
            })
    }

    /// Looks up the text-write codec for a content type.
    pub fn text_encoder(&self, content_type: &str) -> Result<Arc<dyn TextEncoder>, ContentError> {
        let essence = normalize(content_type);
        self.text_encoders
            .get(&essence)
            .cloned()
            .ok_or(ContentError::UnsupportedType {
                content_type: essence,
                role: CodecRole::TextWrite,
            })
    }

    fn has_codec(&self, essence: &str) -> bool {
        self.byte_decoders.contains_key(essence)
            || self.byte_encoders.contains_key(essence)
            || self.text_decoders.contains_key(essence)
            || self.text_encoders.contains_key(essence)
    }

    fn require_codec(&self, essence: &str) -> Result<(), ConfigError> {
        if self.has_codec(essence) {
            Ok(())
        } else {
            Err(ConfigError::MissingCodec {
                content_type: essence.to_string(),
            })
        }
    }
}

impl std::fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRegistry")
            .field("byte_decoders", &self.byte_decoders.len())
            .field("byte_encoders", &self.byte_encoders.len())
            .field("text_decoders", &self.text_decoders.len())
            .field("text_encoders", &self.text_encoders.len())
            .field("binary_types", &self.binary_types.len())
            .field("extensions", &self.extensions)
            .field("fallback_binary", &self.fallback_binary)
            .field("fallback_text", &self.fallback_text)
            .finish()
    }
}
