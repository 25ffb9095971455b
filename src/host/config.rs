//! Host configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a [`StateHost`](crate::host::StateHost).
///
/// Deserializes from any serde format; missing fields take their defaults.
///
/// ```rust
/// use hierarch::host::HostConfig;
///
/// let config: HostConfig = serde_json::from_str(r#"{ "name": "door" }"#).unwrap();
/// assert_eq!(config.name, "door");
/// assert!(config.record_history);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name used in log events and status snapshots
    pub name: String,

    /// Keep a journal of completed transitions
    pub record_history: bool,

    /// Maximum journal entries retained; `None` keeps everything
    pub history_limit: Option<usize>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: "hsm".to_string(),
            record_history: true,
            history_limit: Some(256),
        }
    }
}

impl HostConfig {
    /// Journal capacity implied by the settings.
    pub(crate) fn journal_limit(&self) -> Option<usize> {
        if self.record_history {
            self.history_limit
        } else {
            Some(0)
        }
    }
}
