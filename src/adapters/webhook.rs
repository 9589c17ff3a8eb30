//! Webhook notification channel
//!
//! Relays operator messages through an HTTP webhook. The webhook endpoint is
//! stateless, so the conversation handle is simply the target address.

use crate::error::{LinkwatchError, Result};
use crate::supervisor::traits::NotificationChannel;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

/// Webhook-backed notification client
#[derive(Clone)]
pub struct WebhookChannel {
    client: Client,
    webhook_url: String,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    target: &'a str,
    text: &'a str,
}

impl WebhookChannel {
    /// Create a new webhook channel with an explicit URL
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    /// Create a webhook channel from the environment, if configured
    pub fn from_env() -> Option<Self> {
        std::env::var("LINKWATCH_WEBHOOK_URL").ok().map(|url| {
            info!("Webhook notifications enabled");
            Self::new(url)
        })
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn open_conversation(&self, target: &str) -> Result<String> {
        Ok(target.to_string())
    }

    async fn post_message(&self, handle: &str, text: &str) -> Result<()> {
        let message = WebhookMessage {
            target: handle,
            text,
        };

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;

        if resp.status().is_success() {
            debug!("Webhook notification sent successfully");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(LinkwatchError::Notification(format!(
                "HTTP {}: {}",
                status, body
            )))
        }
    }
}
