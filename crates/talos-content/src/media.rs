//! Content-type grammar.
//!
//! `type/subtype` optionally followed by `;`-separated parameters. Registry
//! keys are always the normalized essence: parameters stripped, whitespace
//! trimmed, `type/subtype` lowercased. Two parameters are interpreted here:
//! `charset=` selects the text decoding charset, and a bare `base64` token
//! (case-insensitive) marks the payload as Base64-wrapped.

/// Returns the normalized essence of a content-type string.
///
/// # Example
///
/// ```rust
/// use talos_content::normalize;
///
/// assert_eq!(normalize(" Text/Plain; charset=UTF-8 "), "text/plain");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// A parsed content-type value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    charset: Option<String>,
    base64: bool,
}

impl MediaType {
    /// Parses a raw content-type header value.
    ///
    /// Parsing is lenient: unknown parameters are ignored, quoting around
    /// parameter values is stripped.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or("").trim().to_ascii_lowercase();

        let mut charset = None;
        let mut base64 = false;
        for param in parts {
            let param = param.trim();
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("charset") {
                    let value = value.trim().trim_matches('"');
                    charset = Some(value.to_ascii_lowercase());
                }
            } else if param.eq_ignore_ascii_case("base64") {
                base64 = true;
            }
        }

        Self {
            essence,
            charset,
            base64,
        }
    }

    /// Returns the normalized `type/subtype` token.
    #[must_use]
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Returns the declared charset, lowercased, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Returns true if the payload is Base64-wrapped.
    #[must_use]
    pub fn is_base64(&self) -> bool {
        self.base64
    }
}
