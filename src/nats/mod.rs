pub mod client;
pub mod messages;

pub use client::{progress_message, NatsNotifier, CLEARED_SUBJECT, PROGRESS_SUBJECT};
pub use messages::{SessionClearedMessage, SessionProgressMessage};
