//! Dispatcher configuration.

use serde::{Deserialize, Serialize};

/// Knobs the embedding application sets before serving.
///
/// Deserializable so deployments can load it from their config files.
///
/// # Example
///
/// ```rust
/// use talos_dispatch::DispatchConfig;
///
/// let config: DispatchConfig = serde_json::from_str(r#"{"max_payload_bytes": 1048576}"#).unwrap();
/// assert_eq!(config.max_payload_bytes, Some(1_048_576));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Upper bound on any single body or part payload, in bytes. Reads past
    /// the bound fail instead of buffering without limit. `None` disables
    /// the check.
    #[serde(default)]
    pub max_payload_bytes: Option<u64>,
}

impl DispatchConfig {
    /// Caps body and part payloads at `limit` bytes.
    #[must_use]
    pub fn with_max_payload_bytes(mut self, limit: u64) -> Self {
        self.max_payload_bytes = Some(limit);
        self
    }
}
