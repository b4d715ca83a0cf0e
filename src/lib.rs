pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod library;
pub mod nats;
pub mod notify;
pub mod playback;
pub mod scheduler;
pub mod session;

pub use audio::{probe, AudioInfo};
pub use clock::{Clock, MonotonicClock, Ticker};
pub use config::Config;
pub use error::{LibraryError, SchedulerError};
pub use http::{create_router, AppState};
pub use library::{Recording, RecordingLibrary, RecordingSource, CHANT_RECORDING_ID};
pub use nats::NatsNotifier;
pub use notify::{LogNotifier, NotificationContent, ProgressNotifier};
pub use playback::{
    PlaybackDriver, PlaybackEvent, PlaybackHandle, PlaybackSource, TimedPlaybackDriver,
};
pub use scheduler::{
    Effect, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerService, ServiceSettings,
    StartSession,
};
pub use session::{MeditationSession, SessionMode, SessionModeKind, SessionSnapshot};
