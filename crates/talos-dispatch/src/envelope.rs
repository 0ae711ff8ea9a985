//! The JSON error envelope written for dispatcher-produced failures.

use serde::Serialize;

/// Body of an error response: a stable machine code plus a human message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    code: String,
    message: String,
}

impl ErrorBody {
    /// Creates an envelope.
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// Serializes to JSON bytes.
    #[must_use]
    pub fn render(&self) -> Vec<u8> {
        // Two string fields cannot fail to serialize.
        serde_json::to_vec(self).unwrap_or_default()
    }
}
