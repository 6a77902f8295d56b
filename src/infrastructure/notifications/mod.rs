//! Error notification sinks

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::traits::Notifier;

/// Reports errors to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn report(&self, error: &(dyn std::error::Error + Send + Sync), channel: Option<&str>) {
        match channel {
            Some(channel) => tracing::error!("[#{}] {}", channel, error),
            None => tracing::error!("{}", error),
        }
    }
}

/// Posts errors to a webhook (Discord/Slack compatible `content` payload).
///
/// Delivery runs on a spawned task so a slow or failing endpoint never
/// blocks the caller.
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

#[derive(Serialize)]
struct WebhookPayload {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn report(&self, error: &(dyn std::error::Error + Send + Sync), channel: Option<&str>) {
        LogNotifier.report(error, channel).await;

        let payload = WebhookPayload {
            content: format!("⚠️ {}", error),
            channel: channel.map(|c| c.to_string()),
        };
        let request = self.client.post(&self.url).json(&payload);
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::warn!("Webhook rejected notification: {}", response.status());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Failed to deliver notification: {}", e),
            }
        });
    }
}
