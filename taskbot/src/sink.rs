//! Outbound reply channel for messages the bot pushes on its own.
//!
//! Delivery is best effort: a failed send is logged and dropped.

use std::future::Future;

use taskbot_proto::wire::OutboundMessage;
use tokio::sync::mpsc;

/// Errors that can occur while pushing a message.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The HTTP request failed.
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The webhook answered with a non-success status.
    #[error("webhook returned status {0}")]
    Status(u16),

    /// The receiving side is gone.
    #[error("channel closed")]
    Closed,
}

/// Where pushed messages go.
pub trait ReplySink: Send + Sync {
    /// Delivers `text` to `destination`.
    fn send(
        &self,
        destination: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Sends once and logs a failure. Never retries.
pub async fn deliver<K: ReplySink>(sink: &K, destination: &str, text: &str) -> bool {
    match sink.send(destination, text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(destination, error = %e, "failed to deliver message");
            false
        }
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReplySink for LogSink {
    async fn send(&self, destination: &str, text: &str) -> Result<(), SinkError> {
        tracing::info!(destination, text, "outbound message");
        Ok(())
    }
}

/// POSTs each message as JSON to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: url::Url,
}

impl WebhookSink {
    /// Creates a sink posting to `url`.
    #[must_use]
    pub fn new(url: url::Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// The target URL.
    #[must_use]
    pub const fn url(&self) -> &url::Url {
        &self.url
    }
}

impl ReplySink for WebhookSink {
    async fn send(&self, destination: &str, text: &str) -> Result<(), SinkError> {
        let body = OutboundMessage {
            destination: destination.to_string(),
            text: text.to_string(),
        };
        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(status.as_u16()))
        }
    }
}

/// Forwards messages into an in-process channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that sees its messages.
    #[must_use]
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReplySink for ChannelSink {
    async fn send(&self, destination: &str, text: &str) -> Result<(), SinkError> {
        self.tx
            .send(OutboundMessage {
                destination: destination.to_string(),
                text: text.to_string(),
            })
            .map_err(|_| SinkError::Closed)
    }
}

/// The sink chosen at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredSink {
    /// Deliver to a webhook.
    Webhook(WebhookSink),
    /// Log only.
    Log(LogSink),
}

impl ReplySink for ConfiguredSink {
    async fn send(&self, destination: &str, text: &str) -> Result<(), SinkError> {
        match self {
            Self::Webhook(sink) => sink.send(destination, text).await,
            Self::Log(sink) => sink.send(destination, text).await,
        }
    }
}
