//! Conversational assistant backed by Google Gemini.
//!
//! The assistant answers helpdesk questions, grounding its replies on the
//! knowledge-base resources that best match the user's message.

pub mod wizard;

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::GeminiConfig;
use crate::errors::AppError;
use crate::models::Resource;

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;
/// Only the most recent turns of the conversation are forwarded.
pub const MAX_HISTORY_TURNS: usize = 20;
/// Knowledge-base hits folded into the system instruction.
pub const KNOWLEDGE_HITS: usize = 3;

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_OUTPUT_TOKENS: u32 = 1024;

const BASE_INSTRUCTION: &str = "You are the assistant of an IT helpdesk team. \
Answer concisely in the language the user writes in. \
When the knowledge base below is relevant, base your answer on it and mention the resource titles you used. \
If you do not know the answer, say so and suggest opening a ticket.";

#[derive(Debug, Clone, Error)]
pub enum GeminiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("response contained no text")]
    EmptyResponse,
}

impl GeminiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Role name on the Gemini wire.
    fn gemini_role(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        }
    }
}

/// A previous message of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl AssistantRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }
        Ok(())
    }

    /// The tail of the history that is sent to the model.
    pub fn recent_history(&self) -> &[ChatTurn] {
        let skip = self.history.len().saturating_sub(MAX_HISTORY_TURNS);
        &self.history[skip..]
    }
}

/// A knowledge-base resource the reply was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl From<&Resource> for Source {
    fn from(resource: &Resource) -> Self {
        Self {
            id: resource.id.clone(),
            title: resource.title.clone(),
            url: resource.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
    pub sources: Vec<Source>,
}

/// System instruction with the matching resources appended.
pub fn system_instruction(knowledge: &[Resource]) -> String {
    if knowledge.is_empty() {
        return BASE_INSTRUCTION.to_string();
    }

    let mut instruction = String::from(BASE_INSTRUCTION);
    instruction.push_str("\n\nKnowledge base:");
    for (i, resource) in knowledge.iter().enumerate() {
        instruction.push_str(&format!("\n[{}] {}", i + 1, resource.title));
        if let Some(description) = resource.description.as_deref().filter(|d| !d.is_empty()) {
            instruction.push_str(&format!("\n    {}", description));
        }
        if !resource.tags.is_empty() {
            instruction.push_str(&format!("\n    tags: {}", resource.tags.join(", ")));
        }
        instruction.push_str(&format!("\n    url: {}", resource.url));
    }
    instruction
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

/// Request body for `generateContent`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Response from `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Gemini API client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    endpoint: String,
    min_retry_delay: Duration,
}

impl GeminiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("helpdesk-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GeminiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                config.model
            ),
            min_retry_delay: Duration::from_secs(1),
        })
    }

    /// Shorten the backoff, for talking to local mock servers.
    #[cfg(test)]
    pub fn with_min_retry_delay(mut self, delay: Duration) -> Self {
        self.min_retry_delay = delay;
        self
    }

    /// Ask the model for the next reply of the conversation.
    pub async fn generate(
        &self,
        system: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<String, GeminiError> {
        let mut contents: Vec<Content> = history
            .iter()
            .filter(|turn| !turn.content.trim().is_empty())
            .map(|turn| Content::text(Some(turn.role.gemini_role()), turn.content.clone()))
            .collect();
        contents.push(Content::text(Some("user"), message));

        let request = GenerateRequest {
            system_instruction: Content::text(None, system),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: 0.3,
            },
        };

        let response = (|| async { self.send_request(&request).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(self.min_retry_delay)
                    .with_max_delay(Duration::from_secs(20))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &GeminiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "Gemini API call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await?;

        response.text().ok_or(GeminiError::EmptyResponse)
    }

    async fn send_request(&self, request: &GenerateRequest) -> Result<GenerateResponse, GeminiError> {
        let res = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<GenerateResponse>()
                .await
                .map_err(|e| GeminiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GeminiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(GeminiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(GeminiError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> GeminiError {
    if e.is_timeout() {
        GeminiError::Timeout
    } else {
        GeminiError::Transport(e.to_string())
    }
}
