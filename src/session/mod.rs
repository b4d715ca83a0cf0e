//! Meditation session state
//!
//! This module provides the `MeditationSession` record owned by the
//! scheduler:
//! - Selected recording and replay mode
//! - Next play and session end instants
//! - Pause state with frozen remaining durations
//! - Serializable snapshots for the UI layer

mod session;
mod snapshot;

pub use session::{MeditationSession, SessionMode};
pub use snapshot::{SessionModeKind, SessionSnapshot};
