/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Only the local Ollama runtime is wired in; the enum keeps the provider
/// explicit in configs and health snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Local Ollama runtime (`/api/chat`, `/api/tags`).
    Ollama,
}
