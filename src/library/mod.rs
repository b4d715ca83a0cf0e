//! Recording library
//!
//! Read access by id is all the scheduler needs; listing, importing and
//! deleting are used by the HTTP API and the CLI.

mod recording;
mod store;

pub use recording::Recording;
pub use store::{RecordingLibrary, CHANT_RECORDING_ID, MAX_CLIP_DURATION, MIN_CLIP_DURATION};

/// Lookup of recordings by identifier
pub trait RecordingSource: Send + Sync {
    fn find_by_id(&self, id: &str) -> Option<Recording>;
}
