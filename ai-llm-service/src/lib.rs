//! Shared LLM service for the review bot: Ollama chat client, env-driven
//! model config, health probe and a unified error type.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod services;

pub use config::default_config::config_ollama_review;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, Result};
pub use health_service::{HealthService, HealthStatus};
pub use services::ollama_service::OllamaService;
