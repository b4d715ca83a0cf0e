use anyhow::{Context, Result};
use async_nats::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{SessionClearedMessage, SessionProgressMessage};
use crate::notify::{NotificationContent, ProgressNotifier};

pub const PROGRESS_SUBJECT: &str = "meditation.session.progress";
pub const CLEARED_SUBJECT: &str = "meditation.session.cleared";

/// Progress notifier publishing to NATS
pub struct NatsNotifier {
    client: Client,
}

impl NatsNotifier {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    async fn publish<T: serde::Serialize + Sync>(&self, subject: &'static str, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.to_string(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        debug!("Published to {}", subject);
        Ok(())
    }
}

pub fn progress_message(remaining: Option<Duration>, paused: bool) -> SessionProgressMessage {
    let content = NotificationContent::new(remaining, paused);

    SessionProgressMessage {
        title: content.title,
        body: content.body,
        remaining_ms: remaining.map(|d| d.as_millis() as u64),
        paused,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

#[async_trait::async_trait]
impl ProgressNotifier for NatsNotifier {
    async fn update(&self, remaining: Option<Duration>, paused: bool) -> Result<()> {
        self.publish(PROGRESS_SUBJECT, &progress_message(remaining, paused))
            .await
    }

    async fn clear(&self) -> Result<()> {
        let message = SessionClearedMessage {
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        self.publish(CLEARED_SUBJECT, &message).await
    }
}
