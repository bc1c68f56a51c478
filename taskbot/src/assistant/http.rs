//! HTTP client for hosted LLM APIs.
//!
//! The wire format is picked from the endpoint URL: Anthropic and Gemini
//! hosts get their native formats, anything else is treated as
//! OpenAI-compatible.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Assistant, AssistantError};

const MAX_TOKENS: u32 = 1024;

/// Request/response dialect of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI chat completions and compatible servers.
    OpenAi,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl ApiFormat {
    /// Guesses the dialect from the endpoint URL.
    #[must_use]
    pub fn detect(url: &str) -> Self {
        if url.contains("anthropic.com") {
            Self::Anthropic
        } else if url.contains("generativelanguage.googleapis.com") {
            Self::Gemini
        } else {
            Self::OpenAi
        }
    }
}

/// Assistant backed by an HTTP LLM endpoint.
pub struct HttpAssistant {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    format: ApiFormat,
}

impl std::fmt::Debug for HttpAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAssistant")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl HttpAssistant {
    /// Creates a client; the format is detected from `api_url`.
    #[must_use]
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let format = ApiFormat::detect(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            format,
        }
    }

    /// The detected wire format.
    #[must_use]
    pub const fn format(&self) -> ApiFormat {
        self.format
    }

    async fn complete_anthropic(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;
        let body: AnthropicResponse = check(response).await?.json().await?;
        body.content
            .into_iter()
            .map(|c| c.text)
            .find(|t| !t.trim().is_empty())
            .ok_or(AssistantError::EmptyResponse)
    }

    async fn complete_openai(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = OpenAiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body: OpenAiResponse = check(response).await?.json().await?;
        body.choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .find(|t| !t.trim().is_empty())
            .ok_or(AssistantError::EmptyResponse)
    }

    async fn complete_gemini(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };
        let response = self
            .client
            .post(&self.api_url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let body: GeminiResponse = check(response).await?.json().await?;
        let text: String = body
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            Err(AssistantError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

impl Assistant for HttpAssistant {
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        match self.format {
            ApiFormat::Anthropic => self.complete_anthropic(prompt).await,
            ApiFormat::OpenAi => self.complete_openai(prompt).await,
            ApiFormat::Gemini => self.complete_gemini(prompt).await,
        }
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, AssistantError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AssistantError::Api {
        status: status.as_u16(),
        body,
    })
}

// Anthropic
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

// OpenAI-compatible
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// Gemini
#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}
