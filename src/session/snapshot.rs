use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionModeKind {
    FixedInterval,
    CompletionDriven,
}

/// Read-only view of the active session for the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub recording_id: String,

    pub recording_name: String,

    pub mode: SessionModeKind,

    /// Replay interval in milliseconds (fixed-interval sessions only)
    pub interval_ms: Option<i64>,

    /// When the session started
    pub started_at: DateTime<Utc>,

    pub paused: bool,

    pub next_play_at: Option<DateTime<Utc>>,

    pub end_at: Option<DateTime<Utc>>,

    /// Frozen time until next play (paused sessions only)
    pub paused_remaining_ms: Option<i64>,

    /// Session time left as of the last start or resume
    pub remaining_duration_ms: Option<i64>,

    /// Countdown to the next play, frozen while paused
    pub time_until_next_ms: Option<i64>,

    /// Countdown to the end of the session, frozen while paused
    pub time_until_end_ms: Option<i64>,

    /// Last playback failure, cleared by the next successful play
    pub last_error: Option<String>,
}
