//! Chat-completion collaborator boundary.
//!
//! The dialogue loop talks to the model through the `CompletionClient` trait
//! and pattern-matches on the typed result; the only production
//! implementation is `OllamaClient` over the local `/api/chat` endpoint.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::persona::Turn;

/// Generation knobs forwarded to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f64,
    pub repeat_penalty: f64,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            repeat_penalty: 2.0,
        }
    }
}

/// Why a completion call produced no usable content
#[derive(Debug)]
pub enum CompletionError {
    /// Transport, HTTP, or decode failure from the endpoint
    Upstream(String),
    /// The endpoint answered, but the completion was empty or whitespace-only
    Empty,
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::Upstream(msg) => write!(f, "upstream error: {}", msg),
            CompletionError::Empty => write!(f, "empty completion"),
        }
    }
}

impl std::error::Error for CompletionError {}

/// One completion attempt: a full prompt history in, one text completion out.
/// Implementations must treat blank completions as `CompletionError::Empty`.
pub trait CompletionClient {
    fn complete(&self, model: &str, history: &[Turn]) -> Result<String, CompletionError>;
}

/// Ollama chat request structures
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
    options: &'a ChatOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Blocking client for a local Ollama server
pub struct OllamaClient {
    host: String,
    options: ChatOptions,
}

impl OllamaClient {
    pub fn new(host: &str, options: ChatOptions) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            options,
        }
    }
}

impl CompletionClient for OllamaClient {
    fn complete(&self, model: &str, history: &[Turn]) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model,
            messages: history,
            stream: false,
            options: &self.options,
        };
        let request_body =
            serde_json::to_string(&request).map_err(|e| CompletionError::Upstream(e.to_string()))?;

        let url = format!("{}/api/chat", self.host);
        debug!("POST {} ({} messages, model {})", url, history.len(), model);

        let mut response = ureq::post(&url)
            .header("Content-Type", "application/json")
            .send(request_body.as_bytes())
            .map_err(|e| CompletionError::Upstream(e.to_string()))?;

        let response_body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| CompletionError::Upstream(e.to_string()))?;
        let response: ChatResponse =
            serde_json::from_str(&response_body).map_err(|e| CompletionError::Upstream(e.to_string()))?;

        let content = response.message.content.trim().to_string();
        if content.is_empty() {
            return Err(CompletionError::Empty);
        }
        Ok(content)
    }
}
