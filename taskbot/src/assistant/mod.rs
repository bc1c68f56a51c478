//! AI assistant collaborator.
//!
//! The bot only needs "prompt in, text out". [`http::HttpAssistant`] speaks
//! the Anthropic, OpenAI-compatible and Gemini wire formats; the prompt
//! text itself is built in [`prompt`].

pub mod http;
pub mod prompt;

use std::future::Future;

pub use http::{ApiFormat, HttpAssistant};

/// Errors that can occur while asking the assistant.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// No endpoint or key was configured.
    #[error("assistant is not configured")]
    NotConfigured,

    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The API answered but without any text.
    #[error("empty response")]
    EmptyResponse,
}

/// Something that turns a prompt into a reply.
pub trait Assistant: Send + Sync {
    /// Completes `prompt`.
    fn complete(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;
}

/// The assistant chosen at startup.
#[derive(Debug)]
pub enum ConfiguredAssistant {
    /// A real HTTP endpoint.
    Http(HttpAssistant),
    /// No endpoint; every call fails with [`AssistantError::NotConfigured`].
    Disabled,
}

impl ConfiguredAssistant {
    /// Builds an HTTP assistant when both `url` and `key` are present.
    #[must_use]
    pub fn from_parts(url: Option<String>, key: Option<String>, model: String) -> Self {
        match (url, key) {
            (Some(url), Some(key)) if !key.is_empty() => {
                Self::Http(HttpAssistant::new(key, url, model))
            }
            _ => Self::Disabled,
        }
    }

    /// Returns `true` if calls can reach an endpoint.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl Assistant for ConfiguredAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        match self {
            Self::Http(client) => client.complete(prompt).await,
            Self::Disabled => Err(AssistantError::NotConfigured),
        }
    }
}
