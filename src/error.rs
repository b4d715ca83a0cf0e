//! Error types for the meditation scheduler and recording library

use thiserror::Error;

/// Errors reported by the scheduler to its callers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `start_session` was given an id the library cannot resolve
    #[error("Recording not found: {0}")]
    RecordingNotFound(String),

    /// Interval or duration outside the allowed ranges
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The playback driver failed to play or stop a track
    ///
    /// Playback failures degrade the session instead of failing a request:
    /// they are logged and surfaced as `SessionSnapshot::last_error`, never
    /// returned from `SchedulerHandle`.
    #[error("Playback failure: {0}")]
    PlaybackFailure(String),

    /// The scheduler service task is no longer running
    #[error("Scheduler service unavailable")]
    Unavailable,
}

/// Errors from the recording library
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Recording not found: {0}")]
    NotFound(String),

    #[error("Built-in recording cannot be deleted: {0}")]
    DefaultRecording(String),

    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Not a clip in the import directory: {0}")]
    NotImportable(String),

    #[error("Library I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Library index error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to probe clip: {0}")]
    Probe(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
