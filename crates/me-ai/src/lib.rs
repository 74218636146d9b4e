//! Knowledge-grounded personal Q&A: answer questions about Layton from a
//! small, fixed knowledge base.
//!
//! `me-ai` holds everything the HTTP front door needs except HTTP itself:
//!
//! - [`knowledge`]: the two JSON documents (general facts, projects), read
//!   through a [`KnowledgeSource`](knowledge::KnowledgeSource) and memoized by
//!   [`KnowledgeStore`](knowledge::KnowledgeStore).
//! - [`prompt`]: [`build_prompt`](prompt::build_prompt), the pure template that
//!   turns knowledge plus a user message into one prompt string.
//! - This module: the [`OpenAiClient`] for an OpenAI-compatible chat
//!   completions endpoint and the [`CompletionBackend`] seam the request
//!   handler calls through.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use me_ai::knowledge::{FsKnowledgeSource, KnowledgeStore};
//! use me_ai::prompt::build_prompt;
//! use me_ai::{CompletionBackend, OpenAiClient};
//!
//! let store = KnowledgeStore::new(Arc::new(FsKnowledgeSource::new("data")));
//! let client = OpenAiClient::new(std::env::var("OPENAI_API_KEY")?)?;
//!
//! let knowledge = store.get().await?;
//! let prompt = build_prompt(&knowledge, "What are you working on?");
//! let reply = client.complete(&prompt).await?;
//! println!("{reply}");
//! ```

pub mod knowledge;
pub mod prompt;

pub use knowledge::{KnowledgeBase, KnowledgeError, KnowledgeStore};
pub use prompt::build_prompt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

/// Base URL of the OpenAI REST API.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model used for every reply unless overridden.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

// ── Errors ─────────────────────────────────────────────────────────

/// Failure talking to the completion API.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion API HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("completion API error: {0}")]
    Api(String),

    /// The API answered but the first choice carried no message content.
    #[error("completion API returned no reply")]
    EmptyReply,
}

// ── Request types ──────────────────────────────────────────────────

/// Role of a message in the conversation. The persona travels inside the
/// user message, so no other role is ever sent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
}

/// A message in the conversation.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Chat completion request body. Only the fields this service sends;
/// everything else is left to the provider's defaults.
#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// A request carrying exactly one user-role message.
    pub fn single_user(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(content)],
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: Option<RawResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from [`OpenAiClient::chat`].
///
/// `content` is `None` when the API returned no choices or a choice without
/// text; callers decide whether that is an error.
#[derive(Debug)]
pub struct ChatCompletion {
    pub content: Option<String>,
    pub usage: Option<UsageInfo>,
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Deserialize, Debug, Clone)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Turn an HTTP status and response body into a [`ChatCompletion`].
fn parse_completion(status: StatusCode, text: &str) -> Result<ChatCompletion, CompletionError> {
    if !status.is_success() {
        return Err(CompletionError::Http {
            status,
            body: text.to_string(),
        });
    }

    let parsed: RawChatResponse = serde_json::from_str(text)?;

    if let Some(err) = parsed.error {
        return Err(CompletionError::Api(err.message));
    }

    if let Some(ref usage) = parsed.usage {
        debug!(
            "Token usage: prompt={}, completion={}, total={}",
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        );
    }

    let choice = parsed.choices.and_then(|c| c.into_iter().next());
    match choice {
        Some(c) => {
            let content = c.message.and_then(|m| m.content);
            debug!(
                "LLM output: {} chars text",
                content.as_ref().map_or(0, |s| s.len())
            );
            Ok(ChatCompletion {
                content,
                usage: parsed.usage,
                finish_reason: c.finish_reason,
            })
        }
        None => {
            debug!("LLM output: empty (no choices)");
            Ok(ChatCompletion {
                content: None,
                usage: parsed.usage,
                finish_reason: None,
            })
        }
    }
}

// ── Backend seam ───────────────────────────────────────────────────

/// Boxed future returned by [`CompletionBackend::complete`].
pub type CompletionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;

/// Something that turns a finished prompt into reply text.
///
/// The request handler only talks to this trait, so tests can swap the
/// network client for a stub.
pub trait CompletionBackend: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text.
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions API.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl OpenAiClient {
    /// Create a client for the public OpenAI API using [`DEFAULT_MODEL`].
    pub fn new(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("me-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CompletionError::Client)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: OPENAI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Point the client at another OpenAI-compatible base URL
    /// (e.g. `http://127.0.0.1:8080/v1`). A trailing slash is ignored.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Use `model` for every completion.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Send a chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion, CompletionError> {
        debug!(
            "LLM request: model={}, messages={}",
            body.model,
            body.messages.len()
        );
        trace!(
            "Request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        debug!(
            "LLM response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        parse_completion(status, &text)
    }
}

impl CompletionBackend for OpenAiClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> CompletionFuture<'a> {
        Box::pin(async move {
            let body = ChatRequest::single_user(&self.model, prompt);
            let completion = self.chat(&body).await?;
            completion.content.ok_or(CompletionError::EmptyReply)
        })
    }
}
