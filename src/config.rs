use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::library::CHANT_RECORDING_ID;
use crate::scheduler::SchedulerConfig;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub scheduler: SchedulerSection,
    pub library: LibraryConfig,
    pub notifier: NotifierConfig,
    pub playback: PlaybackConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub tick_interval_ms: u64,
    pub completion_delay_ms: u64,
    pub chant_recording_id: String,
    pub min_interval_minutes: u32,
    pub max_interval_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// JSON index of user recordings
    pub index_path: PathBuf,
    /// Directory holding the built-in sounds
    pub sounds_dir: PathBuf,
    /// Only clips under this directory can be imported over HTTP
    pub import_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub update_interval_ms: u64,
    /// Publish progress to NATS instead of the log when set
    pub nats_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Track length assumed when a clip's duration is unknown
    pub fallback_track_ms: u64,
    /// Volume of the looping keep-alive track (0 disables it)
    pub keep_alive_volume: f32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "loqa-meditation".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            completion_delay_ms: 3000,
            chant_recording_id: CHANT_RECORDING_ID.to_string(),
            min_interval_minutes: 1,
            max_interval_minutes: 5,
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("data/recordings.json"),
            sounds_dir: PathBuf::from("assets/sounds"),
            import_dir: PathBuf::from("data/imports"),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 5000,
            nats_url: None,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fallback_track_ms: 30_000,
            keep_alive_volume: 0.01,
        }
    }
}

impl Config {
    /// Load configuration from `path` (extension optional, file optional)
    /// layered with `LOQA_MEDITATION__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LOQA_MEDITATION").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let s = &self.scheduler;
        if s.tick_interval_ms == 0 {
            anyhow::bail!("scheduler.tick_interval_ms must be greater than zero");
        }
        if self.notifier.update_interval_ms == 0 {
            anyhow::bail!("notifier.update_interval_ms must be greater than zero");
        }
        if s.min_interval_minutes == 0 || s.min_interval_minutes > s.max_interval_minutes {
            anyhow::bail!(
                "scheduler interval range {}..={} is invalid",
                s.min_interval_minutes,
                s.max_interval_minutes
            );
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_millis(self.scheduler.tick_interval_ms),
            completion_delay: Duration::from_millis(self.scheduler.completion_delay_ms),
            chant_recording_id: self.scheduler.chant_recording_id.clone(),
            min_interval_minutes: self.scheduler.min_interval_minutes,
            max_interval_minutes: self.scheduler.max_interval_minutes,
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.notifier.update_interval_ms)
    }
}
