// Shared fixtures for scheduler service and HTTP tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use loqa_meditation::{
    MonotonicClock, PlaybackDriver, PlaybackEvent, PlaybackHandle, PlaybackSource,
    ProgressNotifier, Recording, RecordingLibrary, SchedulerConfig, SchedulerHandle,
    SchedulerService, ServiceSettings, CHANT_RECORDING_ID,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const BOWL: &str = "tibetan-bowl";
pub const CHANT_URI: &str = "/sounds/Om-chant.aac";
pub const BOWL_URI: &str = "/sounds/tibetan-bowl.aac";

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Play {
        handle: PlaybackHandle,
        uri: String,
        looping: bool,
    },
    Stop(PlaybackHandle),
    Pause(PlaybackHandle),
    Resume(PlaybackHandle),
}

/// Playback driver that records calls; completions are sent by the test
#[derive(Clone, Default)]
pub struct FakeDriver {
    pub calls: Arc<Mutex<Vec<DriverCall>>>,
    pub fail_plays: Arc<AtomicBool>,
    next_id: Arc<AtomicU64>,
}

impl FakeDriver {
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Handles of one-shot plays of `uri`, in order
    pub fn plays_of(&self, uri: &str) -> Vec<PlaybackHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::Play {
                    handle,
                    uri: played,
                    looping: false,
                } if played == uri => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn keep_alive_handle(&self) -> Option<PlaybackHandle> {
        self.calls().into_iter().find_map(|call| match call {
            DriverCall::Play {
                handle,
                looping: true,
                ..
            } => Some(handle),
            _ => None,
        })
    }

    fn record(&self, call: DriverCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl PlaybackDriver for FakeDriver {
    async fn play(&mut self, source: &PlaybackSource) -> Result<PlaybackHandle> {
        if self.fail_plays.load(Ordering::SeqCst) {
            bail!("output device unavailable");
        }
        let handle = PlaybackHandle(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.record(DriverCall::Play {
            handle,
            uri: source.uri.clone(),
            looping: source.looping,
        });
        Ok(handle)
    }

    async fn stop(&mut self, handle: PlaybackHandle) -> Result<()> {
        self.record(DriverCall::Stop(handle));
        Ok(())
    }

    async fn pause(&mut self, handle: PlaybackHandle) -> Result<()> {
        self.record(DriverCall::Pause(handle));
        Ok(())
    }

    async fn resume(&mut self, handle: PlaybackHandle) -> Result<()> {
        self.record(DriverCall::Resume(handle));
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Update {
        remaining: Option<Duration>,
        paused: bool,
    },
    Cleared,
}

#[derive(Clone, Default)]
pub struct FakeNotifier {
    pub notifications: Arc<Mutex<Vec<Notification>>>,
}

impl FakeNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProgressNotifier for FakeNotifier {
    async fn update(&self, remaining: Option<Duration>, paused: bool) -> Result<()> {
        self.notifications
            .lock()
            .unwrap()
            .push(Notification::Update { remaining, paused });
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.notifications.lock().unwrap().push(Notification::Cleared);
        Ok(())
    }
}

pub fn builtin_recordings() -> Vec<Recording> {
    vec![
        Recording {
            id: CHANT_RECORDING_ID.to_string(),
            name: "Om Chant Meditation".to_string(),
            uri: CHANT_URI.to_string(),
            duration: 44_000,
            created_at: 0,
            is_default: true,
        },
        Recording {
            id: BOWL.to_string(),
            name: "Tibetan Singing Bowl Meditation".to_string(),
            uri: BOWL_URI.to_string(),
            duration: 12_000,
            created_at: 0,
            is_default: true,
        },
    ]
}

/// Write a silent 16-bit WAV clip
pub fn write_wav(path: &Path, duration: Duration, sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let frames = (duration.as_secs_f64() * sample_rate as f64) as u64;
    for _ in 0..frames * channels as u64 {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    Ok(())
}

pub fn t(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

pub struct Harness {
    pub handle: SchedulerHandle,
    pub task: JoinHandle<()>,
    pub driver: FakeDriver,
    pub notifier: FakeNotifier,
    pub events: mpsc::UnboundedSender<PlaybackEvent>,
    pub library: Arc<RecordingLibrary>,
    /// The library's import directory
    pub imports: PathBuf,
    _dir: TempDir,
}

/// Start a scheduler service whose clock reads t(0) at creation
///
/// Must be called inside a runtime with paused time.
pub fn harness(with_keep_alive: bool) -> Harness {
    let dir = TempDir::new().unwrap();
    let imports = dir.path().join("imports");
    std::fs::create_dir(&imports).unwrap();
    let library = Arc::new(
        RecordingLibrary::open(dir.path().join("recordings.json"), builtin_recordings())
            .unwrap()
            .with_import_dir(&imports),
    );

    let driver = FakeDriver::default();
    let notifier = FakeNotifier::default();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let keep_alive = with_keep_alive.then(|| PlaybackSource {
        uri: CHANT_URI.to_string(),
        duration: Duration::from_secs(44),
        looping: true,
        volume: 0.01,
    });

    let service = SchedulerService::new(
        SchedulerConfig::default(),
        library.clone(),
        Box::new(driver.clone()),
        Arc::new(notifier.clone()),
        Arc::new(MonotonicClock::anchored_at(t(0))),
        ServiceSettings {
            progress_interval: Duration::from_secs(5),
            fallback_track_duration: Duration::from_secs(30),
            keep_alive,
        },
    );
    let (handle, task) = service.spawn(events_rx);

    Harness {
        handle,
        task,
        driver,
        notifier,
        events: events_tx,
        library,
        imports,
        _dir: dir,
    }
}
