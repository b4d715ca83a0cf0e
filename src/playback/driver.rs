use crate::library::Recording;
use anyhow::Result;
use std::fmt;
use std::time::Duration;

/// Identifies one started track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(pub u64);

impl fmt::Display for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "track-{}", self.0)
    }
}

/// Events delivered by a playback driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The track reached its end on its own
    ///
    /// Sent at most once per handle, and never after `stop` on that handle.
    Completed(PlaybackHandle),
}

/// What a driver should play
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSource {
    /// Location of the playable content
    pub uri: String,
    /// Track length
    pub duration: Duration,
    /// Loop forever (never completes)
    pub looping: bool,
    /// Volume from 0.0 to 1.0
    pub volume: f32,
}

impl PlaybackSource {
    /// Play a recording once at full volume
    ///
    /// `fallback_duration` stands in for recordings whose length is unknown.
    pub fn once(recording: &Recording, fallback_duration: Duration) -> Self {
        let duration = match recording.duration() {
            d if d.is_zero() => fallback_duration,
            d => d,
        };

        Self {
            uri: recording.uri.clone(),
            duration,
            looping: false,
            volume: 1.0,
        }
    }

    /// Loop a recording quietly in the background
    pub fn keep_alive(recording: &Recording, volume: f32) -> Self {
        Self {
            uri: recording.uri.clone(),
            duration: recording.duration(),
            looping: true,
            volume,
        }
    }
}

/// Playback driver trait
///
/// Drivers are fire-and-forget from the scheduler's point of view: `play`
/// returns as soon as the track has started, and natural completion is
/// reported asynchronously as a `PlaybackEvent` on the channel the driver
/// was created with.
#[async_trait::async_trait]
pub trait PlaybackDriver: Send + Sync {
    /// Start playing a source from the beginning
    async fn play(&mut self, source: &PlaybackSource) -> Result<PlaybackHandle>;

    /// Stop a track and release its resources; unknown handles are ignored
    async fn stop(&mut self, handle: PlaybackHandle) -> Result<()>;

    /// Freeze a track at its current position
    async fn pause(&mut self, handle: PlaybackHandle) -> Result<()>;

    /// Continue a paused track from its frozen position
    async fn resume(&mut self, handle: PlaybackHandle) -> Result<()>;

    /// Get driver name for logging
    fn name(&self) -> &str;
}
