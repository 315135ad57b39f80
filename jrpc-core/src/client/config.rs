use crate::rpc::codec::DispatchPolicy;
use serde::{Deserialize, Serialize};

/// Per-client settings.
///
/// Every field has a default, so a host application can embed this in its own
/// configuration file and only spell out what it changes:
///
/// ```rust
/// use jrpc_core::{ClientConfig, DispatchPolicy};
///
/// let config: ClientConfig = serde_json::from_str(r#"{ "dispatch": "truthy" }"#).unwrap();
///
/// assert_eq!(config.dispatch, DispatchPolicy::Truthy);
/// assert!(config.content_type);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How decoded responses are classified as successes or failures.
    pub dispatch: DispatchPolicy,
    /// Whether requests carry `Content-Type: application/json`.
    pub content_type: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchPolicy::default(),
            content_type: true,
        }
    }
}
