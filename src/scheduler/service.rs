use super::config::{SchedulerConfig, StartSession};
use super::machine::{Effect, Scheduler};
use crate::clock::{Clock, Ticker};
use crate::error::{Result, SchedulerError};
use crate::library::{Recording, RecordingSource};
use crate::notify::ProgressNotifier;
use crate::playback::{PlaybackDriver, PlaybackEvent, PlaybackHandle, PlaybackSource};
use crate::session::SessionSnapshot;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Settings for the scheduler service beyond the core state machine
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// How often progress is pushed to the notifier while a session runs
    pub progress_interval: Duration,

    /// Track length assumed for recordings of unknown duration
    pub fallback_track_duration: Duration,

    /// Quiet looping track that keeps the host awake during a session
    pub keep_alive: Option<PlaybackSource>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(5),
            fallback_track_duration: Duration::from_secs(30),
            keep_alive: None,
        }
    }
}

/// Messages accepted by the scheduler service
pub enum SchedulerCommand {
    Start {
        request: StartSession,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    Pause {
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
    Resume {
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Option<SessionSnapshot>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProgressUpdates {
    Stopped,
    Running { end_at: Option<DateTime<Utc>> },
}

/// Scheduler service
///
/// Owns the `Scheduler` and its collaborators, and processes lifecycle
/// commands, ticks and playback events one at a time from a single task.
/// Every state change therefore happens on a consistent view of the session.
pub struct SchedulerService {
    scheduler: Scheduler,
    library: Arc<dyn RecordingSource>,
    driver: Box<dyn PlaybackDriver>,
    notifier: Arc<dyn ProgressNotifier>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,

    /// Track started by the last play
    current_track: Option<PlaybackHandle>,

    keep_alive_track: Option<PlaybackHandle>,

    progress: ProgressUpdates,
    restart_progress_timer: bool,

    last_error: Option<String>,
}

impl SchedulerService {
    pub fn new(
        config: SchedulerConfig,
        library: Arc<dyn RecordingSource>,
        driver: Box<dyn PlaybackDriver>,
        notifier: Arc<dyn ProgressNotifier>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(config),
            library,
            driver,
            notifier,
            clock,
            settings,
            current_track: None,
            keep_alive_track: None,
            progress: ProgressUpdates::Stopped,
            restart_progress_timer: false,
            last_error: None,
        }
    }

    /// Spawn the service task
    ///
    /// `events` must be the receiving end of the channel the playback driver
    /// reports completions on.
    pub fn spawn(
        self,
        events: mpsc::UnboundedReceiver<PlaybackEvent>,
    ) -> (SchedulerHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let task = tokio::spawn(self.run(commands_rx, events));
        (SchedulerHandle { commands: commands_tx }, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SchedulerCommand>,
        mut events: mpsc::UnboundedReceiver<PlaybackEvent>,
    ) {
        info!(
            "Scheduler service started (driver={}, tick={}ms)",
            self.driver.name(),
            self.scheduler.config().tick_interval.as_millis()
        );

        let mut ticker = Ticker::new(self.scheduler.config().tick_interval);
        let mut progress_ticker = Ticker::new(self.settings.progress_interval);

        loop {
            // Due ticks and playback events are handled before new commands
            tokio::select! {
                biased;

                Some(event) = events.recv() => self.handle_event(event).await,
                _ = ticker.tick() => self.handle_tick().await,
                _ = progress_ticker.tick(), if self.progress != ProgressUpdates::Stopped => {
                    let now = self.clock.now();
                    self.publish_progress(now).await;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }

            if std::mem::take(&mut self.restart_progress_timer) {
                progress_ticker.reset();
            }
        }

        let now = self.clock.now();
        let effects = self.scheduler.stop_session();
        self.apply(effects, now).await;

        info!("Scheduler service stopped");
    }

    async fn handle_command(&mut self, command: SchedulerCommand) {
        let now = self.clock.now();

        match command {
            SchedulerCommand::Start { request, reply } => {
                let result = match self
                    .scheduler
                    .start_session(self.library.as_ref(), &request, now)
                {
                    Ok(effects) => {
                        self.last_error = None;
                        self.apply(effects, now).await;
                        self.snapshot(now).ok_or(SchedulerError::Unavailable)
                    }
                    Err(e) => {
                        warn!("Rejected session start: {}", e);
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            SchedulerCommand::Pause { reply } => {
                let effects = self.scheduler.pause_session(now);
                self.apply(effects, now).await;
                let _ = reply.send(self.snapshot(now));
            }
            SchedulerCommand::Resume { reply } => {
                let effects = self.scheduler.resume_session(now);
                self.apply(effects, now).await;
                let _ = reply.send(self.snapshot(now));
            }
            SchedulerCommand::Stop { reply } => {
                let effects = self.scheduler.stop_session();
                self.apply(effects, now).await;
                self.last_error = None;
                let _ = reply.send(());
            }
            SchedulerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot(now));
            }
        }
    }

    async fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::Completed(handle) => {
                if self.current_track != Some(handle) || !self.scheduler.is_active() {
                    debug!("Ignoring completion of stale {}", handle);
                    return;
                }

                self.current_track = None;
                if let Err(e) = self.driver.stop(handle).await {
                    warn!("Failed to release completed {}: {:#}", handle, e);
                }
                self.scheduler.on_playback_completed(self.clock.now());
            }
        }
    }

    async fn handle_tick(&mut self) {
        let now = self.clock.now();
        let effects = self.scheduler.tick(now);
        self.apply(effects, now).await;
    }

    async fn apply(&mut self, effects: Vec<Effect>, now: DateTime<Utc>) {
        for effect in effects {
            match effect {
                Effect::Play(recording) => self.play(&recording, now).await,
                Effect::Release => self.release().await,
                Effect::StartKeepAlive => self.start_keep_alive().await,
                Effect::PauseKeepAlive => {
                    if let Some(handle) = self.keep_alive_track {
                        if let Err(e) = self.driver.pause(handle).await {
                            warn!("Failed to pause keep-alive: {:#}", e);
                        }
                    }
                }
                Effect::ResumeKeepAlive => {
                    if let Some(handle) = self.keep_alive_track {
                        if let Err(e) = self.driver.resume(handle).await {
                            warn!("Failed to resume keep-alive: {:#}", e);
                        }
                    }
                }
                Effect::StartProgress { end_at } => {
                    self.progress = ProgressUpdates::Running { end_at };
                    self.restart_progress_timer = true;
                    self.publish_progress(now).await;
                }
                Effect::PauseProgress { remaining } => {
                    self.progress = ProgressUpdates::Stopped;
                    self.notify(remaining.map(to_std), true).await;
                }
                Effect::StopProgress => {
                    self.progress = ProgressUpdates::Stopped;
                    if let Err(e) = self.notifier.clear().await {
                        debug!("Notifier clear failed: {:#}", e);
                    }
                }
            }
        }
    }

    async fn play(&mut self, recording: &Recording, now: DateTime<Utc>) {
        if let Some(previous) = self.current_track.take() {
            if let Err(e) = self.driver.stop(previous).await {
                let error = SchedulerError::PlaybackFailure(format!("{:#}", e));
                warn!("Failed to stop {}: {}", previous, error);
            }
        }

        let source = PlaybackSource::once(recording, self.settings.fallback_track_duration);
        match self.driver.play(&source).await {
            Ok(handle) => {
                self.current_track = Some(handle);
                self.last_error = None;
            }
            Err(e) => {
                let error = SchedulerError::PlaybackFailure(format!("{:#}", e));
                warn!("Failed to play {}: {}", recording.id, error);
                self.last_error = Some(error.to_string());
                self.scheduler.on_playback_failed(now);
            }
        }
    }

    async fn start_keep_alive(&mut self) {
        let Some(source) = self.settings.keep_alive.clone() else {
            return;
        };

        if let Some(previous) = self.keep_alive_track.take() {
            if let Err(e) = self.driver.stop(previous).await {
                warn!("Failed to stop keep-alive {}: {:#}", previous, e);
            }
        }

        match self.driver.play(&source).await {
            Ok(handle) => self.keep_alive_track = Some(handle),
            Err(e) => warn!("Failed to start keep-alive: {:#}", e),
        }
    }

    async fn release(&mut self) {
        for handle in [self.current_track.take(), self.keep_alive_track.take()]
            .into_iter()
            .flatten()
        {
            if let Err(e) = self.driver.stop(handle).await {
                let error = SchedulerError::PlaybackFailure(format!("{:#}", e));
                warn!("Failed to release {}: {}", handle, error);
            }
        }
    }

    async fn publish_progress(&self, now: DateTime<Utc>) {
        if let ProgressUpdates::Running { end_at } = self.progress {
            let remaining = end_at.map(|end_at| to_std(end_at - now));
            self.notify(remaining, false).await;
        }
    }

    async fn notify(&self, remaining: Option<Duration>, paused: bool) {
        if let Err(e) = self.notifier.update(remaining, paused).await {
            debug!("Notifier update failed: {:#}", e);
        }
    }

    fn snapshot(&self, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        self.scheduler.snapshot(now, self.last_error.clone())
    }
}

/// Negative deltas clamp to zero
fn to_std(delta: TimeDelta) -> Duration {
    delta.to_std().unwrap_or_default()
}

/// Cloneable front end to the scheduler service
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Start a session, replacing any session already running
    pub async fn start_session(&self, request: StartSession) -> Result<SessionSnapshot> {
        self.request(|reply| SchedulerCommand::Start { request, reply })
            .await?
    }

    /// Pause the session; returns the resulting state, `None` without a session
    pub async fn pause_session(&self) -> Result<Option<SessionSnapshot>> {
        self.request(|reply| SchedulerCommand::Pause { reply }).await
    }

    pub async fn resume_session(&self) -> Result<Option<SessionSnapshot>> {
        self.request(|reply| SchedulerCommand::Resume { reply }).await
    }

    /// Stop the session; safe to call when none is active
    pub async fn stop_session(&self) -> Result<()> {
        self.request(|reply| SchedulerCommand::Stop { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Option<SessionSnapshot>> {
        self.request(|reply| SchedulerCommand::Snapshot { reply })
            .await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| SchedulerError::Unavailable)?;
        reply_rx.await.map_err(|_| SchedulerError::Unavailable)
    }
}
