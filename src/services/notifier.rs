//! Outbound notification port and its HTTP implementation
//!
//! Notifications are best-effort: callers log failures and move on.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sink for partial device updates
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `payload` under `topic` (conventionally `<namespace>/<key>`).
    async fn send(&self, topic: &str, payload: &Value) -> Result<(), NotifyError>;

    /// Human-readable name of this channel, used in logs
    fn channel_name(&self) -> &str;
}

/// Body posted to the external sink: the update travels as a JSON string.
#[derive(Debug, Serialize)]
struct Submission<'a> {
    topic: &'a str,
    data: String,
}

/// Posts `{topic, data}` JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    url: String,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, topic: &str, payload: &Value) -> Result<(), NotifyError> {
        let submission = Submission {
            topic,
            data: serde_json::to_string(payload)?,
        };

        let response = self.client.post(&self.url).json(&submission).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Submitted {} to {} ({})", topic, self.url, status);
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "http"
    }
}

/// Used when no sink is configured; only logs what would have been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, topic: &str, payload: &Value) -> Result<(), NotifyError> {
        debug!("No notification sink configured, dropping {} {}", topic, payload);
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
