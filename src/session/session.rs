use super::snapshot::{SessionModeKind, SessionSnapshot};
use crate::library::Recording;
use chrono::{DateTime, TimeDelta, Utc};

/// How replays of the session's recording are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Replay every `interval`, regardless of when the track finished
    FixedInterval { interval: TimeDelta },

    /// Replay `delay` after each natural completion of the track
    CompletionDriven { delay: TimeDelta },
}

impl SessionMode {
    pub fn kind(&self) -> SessionModeKind {
        match self {
            SessionMode::FixedInterval { .. } => SessionModeKind::FixedInterval,
            SessionMode::CompletionDriven { .. } => SessionModeKind::CompletionDriven,
        }
    }
}

/// The single in-progress meditation session
///
/// While running, `next_play_at` and `end_at` are absolute instants. While
/// paused both are cleared and frozen as `paused_remaining` and
/// `total_duration` respectively.
#[derive(Debug, Clone, PartialEq)]
pub struct MeditationSession {
    /// Snapshot of the recording resolved at start
    pub recording: Recording,

    pub mode: SessionMode,

    pub started_at: DateTime<Utc>,

    /// Session time left as of the last start or resume, if bounded
    pub total_duration: Option<TimeDelta>,

    pub paused: bool,

    /// Time until the next play, frozen at pause
    pub paused_remaining: Option<TimeDelta>,

    /// `None` while a completion-driven session waits for the track to finish
    pub next_play_at: Option<DateTime<Utc>>,

    /// `None` for unbounded sessions and while paused
    pub end_at: Option<DateTime<Utc>>,
}

impl MeditationSession {
    pub fn recording_id(&self) -> &str {
        &self.recording.id
    }

    /// Time until the next scheduled play, clamped at zero
    pub fn time_until_next(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        if self.paused {
            return self.paused_remaining;
        }
        self.next_play_at
            .map(|at| (at - now).max(TimeDelta::zero()))
    }

    /// Time until the session ends, clamped at zero
    pub fn time_until_end(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        if self.paused {
            return self.total_duration;
        }
        self.end_at.map(|at| (at - now).max(TimeDelta::zero()))
    }

    pub fn snapshot(&self, now: DateTime<Utc>, last_error: Option<String>) -> SessionSnapshot {
        let interval_ms = match self.mode {
            SessionMode::FixedInterval { interval } => Some(interval.num_milliseconds()),
            SessionMode::CompletionDriven { .. } => None,
        };

        SessionSnapshot {
            recording_id: self.recording.id.clone(),
            recording_name: self.recording.name.clone(),
            mode: self.mode.kind(),
            interval_ms,
            started_at: self.started_at,
            paused: self.paused,
            next_play_at: self.next_play_at,
            end_at: self.end_at,
            paused_remaining_ms: self.paused_remaining.map(|d| d.num_milliseconds()),
            remaining_duration_ms: self.total_duration.map(|d| d.num_milliseconds()),
            time_until_next_ms: self.time_until_next(now).map(|d| d.num_milliseconds()),
            time_until_end_ms: self.time_until_end(now).map(|d| d.num_milliseconds()),
            last_error,
        }
    }
}
