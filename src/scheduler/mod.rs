//! Session scheduler
//!
//! `Scheduler` is the pure state machine deciding when the session's
//! recording is (re)played and when the session ends. `SchedulerService`
//! drives it from a tick source and playback events, and carries out the
//! effects it requests against the playback driver and notifier.

mod config;
mod machine;
mod service;

pub use config::{SchedulerConfig, StartSession};
pub use machine::{Effect, Scheduler};
pub use service::{SchedulerCommand, SchedulerHandle, SchedulerService, ServiceSettings};
