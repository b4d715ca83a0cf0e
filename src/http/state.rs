use crate::library::RecordingLibrary;
use crate::scheduler::SchedulerHandle;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Front end to the session scheduler
    pub scheduler: SchedulerHandle,

    /// Recording library (built-in and user recordings)
    pub library: Arc<RecordingLibrary>,
}

impl AppState {
    pub fn new(scheduler: SchedulerHandle, library: Arc<RecordingLibrary>) -> Self {
        Self { scheduler, library }
    }
}
