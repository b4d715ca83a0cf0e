//! HTTP API server for the meditation UI
//!
//! This module provides a REST API over the scheduler and the library:
//! - GET /recordings, POST /recordings, DELETE /recordings/:id
//! - GET /session - Current session snapshot
//! - POST /session/start|pause|resume|stop - Session lifecycle
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
