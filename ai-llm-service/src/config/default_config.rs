//! Default LLM config loaded from environment variables.
//!
//! # Environment variables
//!
//! - `OLLAMA_URL`       = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`     = review model (default `deepseek-r1:14b`)
//! - `OLLAMA_NUM_CTX`   = context window in tokens (default `32768`)
//! - `LLM_TIMEOUT_SECS` = request timeout (default `600`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt_u32, env_opt_u64, env_or, validate_http_endpoint},
};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_REVIEW_MODEL: &str = "deepseek-r1:14b";
pub const DEFAULT_NUM_CTX: u32 = 32_768;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Constructs the config for the **review** Ollama model.
///
/// Reviews are single long generations over a large prompt, so the timeout
/// is generous and sampling is left at a low temperature.
///
/// # Errors
///
/// - [`ConfigError::InvalidFormat`] if `OLLAMA_URL` has no http(s) scheme
/// - [`ConfigError::InvalidNumber`] if a numeric variable does not parse
/// - [`ConfigError::EmptyModel`] if the model resolves to an empty string
pub fn config_ollama_review() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = env_or("OLLAMA_URL", DEFAULT_OLLAMA_URL);
    validate_http_endpoint("OLLAMA_URL", &endpoint)?;

    let model = env_or("OLLAMA_MODEL", DEFAULT_REVIEW_MODEL);
    if model.is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }

    let num_ctx = env_opt_u32("OLLAMA_NUM_CTX")?.unwrap_or(DEFAULT_NUM_CTX);
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        num_ctx: Some(num_ctx),
        temperature: Some(0.2),
        timeout_secs: Some(timeout_secs),
    })
}
