//! Lightweight Ollama service for single-turn chat completions.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`: synchronous chat (`stream=false`)
//!
//! It uses the configuration [`LlmModelConfig`] and ensures that the selected
//! provider is [`LlmProvider::Ollama`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::config::llm_model_config::LlmModelConfig;
//! use ai_llm_service::config::llm_provider::LlmProvider;
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "deepseek-r1:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     num_ctx: Some(8192),
//!     temperature: None,
//!     timeout_secs: Some(600),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let text = svc.chat("Review this diff: ...").await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ChatError, ConfigError, Result, make_snippet};

/// Thin client for Ollama.
///
/// Reuses one HTTP client with the configured timeout for every call.
#[derive(Debug, Clone)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidFormat`] if `cfg.endpoint` is empty or lacks http(s)
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(AiLlmError::from(ConfigError::InvalidFormat {
                var: "LLM_PROVIDER",
                reason: "only Ollama is supported",
            }));
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(AiLlmError::from(ConfigError::InvalidFormat {
                var: "OLLAMA_URL",
                reason: "must start with http:// or https://",
            }));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(600));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        let url_chat = format!("{}/api/chat", endpoint.trim_end_matches('/'));

        Ok(Self {
            client,
            cfg,
            url_chat,
        })
    }

    /// Model identifier this service talks to.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a **non-streaming**, single-turn chat request via `/api/chat`.
    ///
    /// The prompt is sent as one `user` message. The assistant text is read
    /// from `message.content`; any missing field along that path yields an
    /// empty string rather than an error.
    ///
    /// # Errors
    /// - [`ChatError::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors (connect, timeout)
    /// - [`ChatError::Decode`] if the body is not JSON
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_chars = prompt.len()))]
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let body = ChatRequest::from_cfg(&self.cfg, prompt);

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ChatError::HttpStatus {
                status,
                url: self.url_chat.clone(),
                snippet: make_snippet(&text),
            }
            .into());
        }

        let out: Value = resp
            .json()
            .await
            .map_err(|e| ChatError::Decode(format!("serde error: {e}; ensure `stream=false` is used")))?;

        Ok(extract_message_content(&out))
    }
}

/// Reads `message.content` from a chat response, tolerating any missing level.
pub fn extract_message_content(resp: &Value) -> String {
    resp.get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

impl<'a> ChatRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        let options = ChatOptions {
            num_ctx: cfg.num_ctx,
            temperature: cfg.temperature,
        };

        Self {
            model: &cfg.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
            options: Some(options),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}
