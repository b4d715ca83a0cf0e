use super::config::{SchedulerConfig, StartSession};
use crate::error::{Result, SchedulerError};
use crate::library::{Recording, RecordingSource};
use crate::session::{MeditationSession, SessionMode, SessionSnapshot};
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Side effect requested by a scheduler transition
///
/// Transitions are pure; the scheduler service carries effects out against
/// the playback driver and the notifier in the order they are returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Stop the current track, if any, and play this recording from the start
    Play(Recording),

    /// Release the session's track and keep-alive
    Release,

    StartKeepAlive,
    PauseKeepAlive,
    ResumeKeepAlive,

    /// Publish progress now and periodically, counting down to `end_at`
    StartProgress { end_at: Option<DateTime<Utc>> },

    /// Publish a single paused update and stop periodic updates
    PauseProgress { remaining: Option<TimeDelta> },

    /// Stop periodic updates and clear the notification
    StopProgress,
}

/// Session scheduler state machine
///
/// Owns the single `MeditationSession`. Every transition takes the current
/// instant explicitly, so the machine is driven entirely by its caller:
/// a periodic tick, playback completions, and the four lifecycle calls.
#[derive(Debug)]
pub struct Scheduler {
    config: SchedulerConfig,
    session: Option<MeditationSession>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&MeditationSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn snapshot(&self, now: DateTime<Utc>, last_error: Option<String>) -> Option<SessionSnapshot> {
        self.session.as_ref().map(|s| s.snapshot(now, last_error))
    }

    /// Start a session, replacing any session already running
    ///
    /// Validation happens before any state changes, so a rejected request
    /// leaves a prior session untouched.
    pub fn start_session(
        &mut self,
        library: &dyn RecordingSource,
        request: &StartSession,
        now: DateTime<Utc>,
    ) -> Result<Vec<Effect>> {
        let recording = library
            .find_by_id(&request.recording_id)
            .ok_or_else(|| SchedulerError::RecordingNotFound(request.recording_id.clone()))?;

        let mode = self.mode_for(&recording, request.interval_minutes)?;

        let total_duration = match request.duration_minutes {
            None => None,
            Some(0) => {
                return Err(SchedulerError::InvalidConfiguration(
                    "session duration must be greater than zero".to_string(),
                ))
            }
            Some(minutes) => Some(TimeDelta::minutes(minutes as i64)),
        };

        let mut effects = Vec::new();
        if let Some(previous) = self.session.take() {
            info!(
                "Replacing active session for recording {}",
                previous.recording_id()
            );
            effects.push(Effect::Release);
            effects.push(Effect::StopProgress);
        }

        let next_play_at = match mode {
            SessionMode::FixedInterval { interval } => Some(now + interval),
            SessionMode::CompletionDriven { .. } => None,
        };
        let end_at = total_duration.map(|d| now + d);

        info!(
            "Starting session: recording={} mode={:?} duration={:?}",
            recording.id,
            mode.kind(),
            request.duration_minutes
        );

        effects.push(Effect::Play(recording.clone()));
        effects.push(Effect::StartKeepAlive);
        effects.push(Effect::StartProgress { end_at });

        self.session = Some(MeditationSession {
            recording,
            mode,
            started_at: now,
            total_duration,
            paused: false,
            paused_remaining: None,
            next_play_at,
            end_at,
        });

        Ok(effects)
    }

    /// Re-evaluate the session at `now`
    ///
    /// Session end is checked before replay, so a session whose end and next
    /// play fall on the same tick stops without replaying.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.paused {
            return Vec::new();
        }

        if let Some(end_at) = session.end_at {
            if now >= end_at {
                info!("Session duration ended, stopping session");
                return self.stop_session();
            }
        }

        match session.next_play_at {
            Some(at) if now >= at => {
                session.next_play_at = match session.mode {
                    SessionMode::FixedInterval { interval } => {
                        Some(next_fixed_play(at, interval, now))
                    }
                    // The next play is scheduled by the completion of this one
                    SessionMode::CompletionDriven { .. } => None,
                };

                debug!(
                    "Replaying {} (next play at {:?})",
                    session.recording.id, session.next_play_at
                );

                vec![Effect::Play(session.recording.clone())]
            }
            _ => Vec::new(),
        }
    }

    /// Handle a natural completion of the session's track
    ///
    /// Only completion-driven sessions react. A completion that arrives
    /// while paused is held as the frozen time until next play.
    pub fn on_playback_completed(&mut self, now: DateTime<Utc>) {
        let Some(session) = self.session.as_mut() else {
            debug!("Playback completed with no active session, ignoring");
            return;
        };

        let SessionMode::CompletionDriven { delay } = session.mode else {
            return;
        };

        if session.paused {
            session.paused_remaining = Some(delay);
        } else {
            session.next_play_at = Some(now + delay);
        }

        debug!("Track completed, next play in {}ms", delay.num_milliseconds());
    }

    /// Handle a failed play of the session's track
    ///
    /// A completion-driven session would otherwise wait forever for a
    /// completion, so the failure schedules a retry as if the track had
    /// finished. Fixed-interval sessions retry at their next play.
    pub fn on_playback_failed(&mut self, now: DateTime<Utc>) {
        if let Some(session) = self.session.as_ref() {
            if matches!(session.mode, SessionMode::CompletionDriven { .. }) {
                warn!("Playback failed, retrying after the completion delay");
                self.on_playback_completed(now);
            }
        }
    }

    pub fn pause_session(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if session.paused {
            return Vec::new();
        }

        session.paused = true;
        session.paused_remaining = session
            .next_play_at
            .take()
            .map(|at| (at - now).max(TimeDelta::zero()));

        if let Some(end_at) = session.end_at.take() {
            session.total_duration = Some((end_at - now).max(TimeDelta::zero()));
        }

        info!(
            "Session paused (next play in {:?}ms, remaining {:?}ms)",
            session.paused_remaining.map(|d| d.num_milliseconds()),
            session.total_duration.map(|d| d.num_milliseconds())
        );

        vec![
            Effect::PauseKeepAlive,
            Effect::PauseProgress {
                remaining: session.total_duration,
            },
        ]
    }

    pub fn resume_session(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if !session.paused {
            return Vec::new();
        }

        session.paused = false;
        if let Some(remaining) = session.paused_remaining.take() {
            session.next_play_at = Some(now + remaining);
        }
        if let Some(total) = session.total_duration {
            session.end_at = Some(now + total);
        }

        info!(
            "Session resumed (next play at {:?}, ends at {:?})",
            session.next_play_at, session.end_at
        );

        vec![
            Effect::ResumeKeepAlive,
            Effect::StartProgress {
                end_at: session.end_at,
            },
        ]
    }

    /// Tear the session down; a no-op when no session is active
    pub fn stop_session(&mut self) -> Vec<Effect> {
        match self.session.take() {
            Some(session) => {
                info!("Session stopped: {}", session.recording_id());
                vec![Effect::Release, Effect::StopProgress]
            }
            None => Vec::new(),
        }
    }

    fn mode_for(&self, recording: &Recording, interval_minutes: u32) -> Result<SessionMode> {
        if recording.id == self.config.chant_recording_id {
            return Ok(SessionMode::CompletionDriven {
                delay: to_time_delta(self.config.completion_delay),
            });
        }

        let (min, max) = (
            self.config.min_interval_minutes,
            self.config.max_interval_minutes,
        );
        if !(min..=max).contains(&interval_minutes) {
            return Err(SchedulerError::InvalidConfiguration(format!(
                "interval must be between {} and {} minutes, got {}",
                min, max, interval_minutes
            )));
        }

        Ok(SessionMode::FixedInterval {
            interval: TimeDelta::minutes(interval_minutes as i64),
        })
    }
}

/// Next fixed-interval play, anchored to the scheduled instant so tick
/// latency does not accumulate. Periods missed entirely restart from `now`.
fn next_fixed_play(at: DateTime<Utc>, interval: TimeDelta, now: DateTime<Utc>) -> DateTime<Utc> {
    let next = at + interval;
    if next > now {
        next
    } else {
        now + interval
    }
}

pub(crate) fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::milliseconds(duration.as_millis() as i64)
}
