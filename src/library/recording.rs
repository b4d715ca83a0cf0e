use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A playable clip in the library
///
/// Recordings are immutable once created. Built-in defaults are never
/// persisted and cannot be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,

    /// Display name (e.g., "Your Recording 3")
    pub name: String,

    /// Location of the playable content
    pub uri: String,

    /// Clip length in milliseconds (0 when unknown)
    pub duration: u64,

    /// Creation time in epoch milliseconds (0 for built-ins)
    pub created_at: i64,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
}

impl Recording {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration)
    }
}
