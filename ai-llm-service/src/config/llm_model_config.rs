use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which LLM backend to use.
/// - `model`: The model identifier (e.g., `"deepseek-r1:14b"`).
/// - `endpoint`: Base URL of the inference server (without `/api/...`).
/// - `num_ctx`: Context window size passed as `options.num_ctx`.
/// - `temperature`: Optional sampling temperature.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Ollama,
///     model: "deepseek-r1:14b".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     num_ctx: Some(32768),
///     temperature: None,
///     timeout_secs: Some(600),
/// };
/// assert_eq!(cfg.provider, LlmProvider::Ollama);
/// ```
#[derive(Debug, Clone)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint base URL.
    pub endpoint: String,

    /// Context window size in tokens.
    pub num_ctx: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
