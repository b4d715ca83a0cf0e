use serde::{Deserialize, Serialize};

/// Session progress message published to NATS
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionProgressMessage {
    pub title: String,
    pub body: String,
    pub remaining_ms: Option<u64>,  // None for unbounded sessions
    pub paused: bool,
    pub timestamp: String,  // RFC3339 timestamp
}

/// Published when the session notification is dismissed
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClearedMessage {
    pub timestamp: String,  // RFC3339 timestamp
}
