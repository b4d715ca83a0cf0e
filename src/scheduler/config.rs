use crate::library::CHANT_RECORDING_ID;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the session scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often the scheduler re-evaluates the session
    /// Default: 1 second
    pub tick_interval: Duration,

    /// Pause between a chant finishing and its replay
    /// Default: 3 seconds
    pub completion_delay: Duration,

    /// Recording whose replays follow its own completion
    pub chant_recording_id: String,

    /// Allowed replay interval range for fixed-interval sessions, in minutes
    pub min_interval_minutes: u32,
    pub max_interval_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            completion_delay: Duration::from_millis(3000),
            chant_recording_id: CHANT_RECORDING_ID.to_string(),
            min_interval_minutes: 1,
            max_interval_minutes: 5,
        }
    }
}

/// Request to start a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSession {
    pub recording_id: String,

    /// Replay interval; ignored for the chant recording
    #[serde(default)]
    pub interval_minutes: u32,

    /// Total session length; `None` runs until stopped
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl StartSession {
    pub fn new(
        recording_id: impl Into<String>,
        interval_minutes: u32,
        duration_minutes: Option<u32>,
    ) -> Self {
        Self {
            recording_id: recording_id.into(),
            interval_minutes,
            duration_minutes,
        }
    }
}
