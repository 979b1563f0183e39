//! Health probe for the Ollama backend.
//!
//! - `GET {endpoint}/api/tags` (best-effort model existence check)
//!
//! [`HealthService::check`] is resilient and never fails (errors mapped to
//! `ok=false`). The strict probe returns a `Result`.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, make_snippet};

/// Health snapshot for a single provider/config.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    #[inline]
    fn new(
        provider: LlmProvider,
        endpoint: &str,
        model: Option<&str>,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{provider:?}"),
            endpoint: endpoint.to_string(),
            model: model.map(str::to_string),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        debug!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self { client })
    }

    /// Checks health for a single LLM config.
    ///
    /// Never returns an error. Any failure is converted to
    /// `HealthStatus { ok: false, message: ... }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();

        match self.try_probe_ollama(cfg).await {
            Ok(status) => {
                info!(
                    endpoint = %status.endpoint,
                    model = %status.model.as_deref().unwrap_or("n/a"),
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(
                    cfg.provider,
                    &cfg.endpoint,
                    Some(&cfg.model),
                    false,
                    start.elapsed().as_millis(),
                    err.to_string(),
                );
                warn!(
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Strict Ollama probe. Returns an error on hard failures.
    ///
    /// A reachable server whose tag list lacks `cfg.model` is reported as
    /// `ok=false` without an error.
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));

        let start = Instant::now();
        debug!(endpoint = %cfg.endpoint, model = %cfg.model, "GET {}", url);

        let resp = self.client.get(&url).send().await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(HealthError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            }
            .into());
        }

        // Expected minimal JSON: { "models": [ { "name": "<model>" }, ... ] }
        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let status = match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) => {
                if models.iter().any(|m| m.name == cfg.model) {
                    HealthStatus::new(
                        cfg.provider,
                        &cfg.endpoint,
                        Some(&cfg.model),
                        true,
                        latency,
                        "Ollama is healthy; model is available",
                    )
                } else {
                    HealthStatus::new(
                        cfg.provider,
                        &cfg.endpoint,
                        Some(&cfg.model),
                        false,
                        latency,
                        "Ollama is up, but model not found in /api/tags",
                    )
                }
            }
            Ok(Tags { models: None }) => HealthStatus::new(
                cfg.provider,
                &cfg.endpoint,
                Some(&cfg.model),
                true,
                latency,
                "Ollama is healthy; tags response without `models` field",
            ),
            Err(e) => HealthStatus::new(
                cfg.provider,
                &cfg.endpoint,
                Some(&cfg.model),
                true,
                latency,
                format!("Ollama is reachable; failed to decode /api/tags: {e}"),
            ),
        };

        Ok(status)
    }
}
