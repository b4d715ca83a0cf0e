//! Background progress notifications
//!
//! The scheduler reports the remaining session time outside the core so a
//! user can follow the session with the screen off. Notifiers are optional
//! and best-effort: failures are logged and otherwise ignored.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Progress notifier trait
#[async_trait::async_trait]
pub trait ProgressNotifier: Send + Sync {
    /// Show the current progress; `remaining` is `None` for unbounded sessions
    async fn update(&self, remaining: Option<Duration>, paused: bool) -> Result<()>;

    /// Remove the notification
    async fn clear(&self) -> Result<()>;
}

/// User-visible notification text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

impl NotificationContent {
    pub fn new(remaining: Option<Duration>, paused: bool) -> Self {
        let title = if paused {
            "Meditation Paused"
        } else {
            "Meditation in Progress"
        };

        let body = match remaining {
            Some(remaining) => format!("Remaining: {}", format_clock(remaining)),
            None => "Finding your inner peace...".to_string(),
        };

        Self {
            title: title.to_string(),
            body,
        }
    }
}

/// Format a duration as `M:SS`, truncating partial seconds
pub fn format_clock(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Notifier that writes progress to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl ProgressNotifier for LogNotifier {
    async fn update(&self, remaining: Option<Duration>, paused: bool) -> Result<()> {
        let content = NotificationContent::new(remaining, paused);
        info!("{}: {}", content.title, content.body);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        info!("Meditation notification cleared");
        Ok(())
    }
}
