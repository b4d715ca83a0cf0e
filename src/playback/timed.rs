// Playback driver that tracks track timing without producing sound

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use super::driver::{PlaybackDriver, PlaybackEvent, PlaybackHandle, PlaybackSource};

struct Track {
    uri: String,
    remaining: Duration,
    resumed_at: Instant,
    looping: bool,
    finished: bool,
    timer: Option<JoinHandle<()>>,
}

impl Track {
    /// Reached its end, whether or not the completion has been consumed
    fn is_finished(&self) -> bool {
        self.finished || self.timer.as_ref().is_some_and(|t| t.is_finished())
    }
}

/// Timer-backed playback driver
///
/// Each track completes after its source duration, honoring pause and
/// resume. Used for headless runs and as the reference behaviour for real
/// output drivers.
pub struct TimedPlaybackDriver {
    events: mpsc::UnboundedSender<PlaybackEvent>,
    tracks: HashMap<PlaybackHandle, Track>,
    next_id: u64,
}

impl TimedPlaybackDriver {
    pub fn new(events: mpsc::UnboundedSender<PlaybackEvent>) -> Self {
        Self {
            events,
            tracks: HashMap::new(),
            next_id: 1,
        }
    }

    /// Number of tracks still playing or paused
    ///
    /// Tracks that ran to completion are not counted, even before the
    /// scheduler stops them.
    pub fn active_tracks(&self) -> usize {
        self.tracks.values().filter(|t| !t.is_finished()).count()
    }

    fn spawn_timer(&self, handle: PlaybackHandle, after: Duration) -> JoinHandle<()> {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            debug!("{} completed", handle);
            // Receiver gone means the scheduler has shut down
            let _ = events.send(PlaybackEvent::Completed(handle));
        })
    }
}

#[async_trait::async_trait]
impl PlaybackDriver for TimedPlaybackDriver {
    async fn play(&mut self, source: &PlaybackSource) -> Result<PlaybackHandle> {
        if !tokio::fs::try_exists(&source.uri).await.unwrap_or(false) {
            bail!("Playback source not found: {}", source.uri);
        }
        if !source.looping && source.duration.is_zero() {
            bail!("Playback source has no duration: {}", source.uri);
        }

        self.tracks.retain(|handle, track| {
            let keep = !track.is_finished();
            if !keep {
                debug!("Evicting finished {}", handle);
            }
            keep
        });

        let handle = PlaybackHandle(self.next_id);
        self.next_id += 1;

        let timer = (!source.looping).then(|| self.spawn_timer(handle, source.duration));

        info!(
            "Playing {} as {} ({}ms, looping={}, volume={:.2})",
            source.uri,
            handle,
            source.duration.as_millis(),
            source.looping,
            source.volume
        );

        self.tracks.insert(
            handle,
            Track {
                uri: source.uri.clone(),
                remaining: source.duration,
                resumed_at: Instant::now(),
                looping: source.looping,
                finished: false,
                timer,
            },
        );

        Ok(handle)
    }

    async fn stop(&mut self, handle: PlaybackHandle) -> Result<()> {
        if let Some(track) = self.tracks.remove(&handle) {
            if let Some(timer) = track.timer {
                timer.abort();
            }
            debug!("Stopped {} ({})", handle, track.uri);
        }
        Ok(())
    }

    async fn pause(&mut self, handle: PlaybackHandle) -> Result<()> {
        let Some(track) = self.tracks.get_mut(&handle) else {
            bail!("Unknown track {}", handle);
        };

        if let Some(timer) = track.timer.take() {
            if timer.is_finished() {
                track.finished = true;
            } else {
                timer.abort();
                track.remaining = track.remaining.saturating_sub(track.resumed_at.elapsed());
            }
        }

        debug!("Paused {} ({}ms left)", handle, track.remaining.as_millis());
        Ok(())
    }

    async fn resume(&mut self, handle: PlaybackHandle) -> Result<()> {
        let (remaining, restart) = match self.tracks.get(&handle) {
            Some(track) => (
                track.remaining,
                !track.looping && !track.finished && track.timer.is_none(),
            ),
            None => bail!("Unknown track {}", handle),
        };

        if restart {
            let timer = self.spawn_timer(handle, remaining);
            if let Some(track) = self.tracks.get_mut(&handle) {
                track.resumed_at = Instant::now();
                track.timer = Some(timer);
            }
        }

        debug!("Resumed {}", handle);
        Ok(())
    }

    fn name(&self) -> &str {
        "timed"
    }
}

impl Drop for TimedPlaybackDriver {
    fn drop(&mut self) {
        for track in self.tracks.values_mut() {
            if let Some(timer) = track.timer.take() {
                timer.abort();
            }
        }
    }
}
