//! Crate-wide error hierarchy for pr-reviewer.
//!
//! - Single root `Error` for all public functions.
//! - Each dependency crate keeps its own typed error; they are wrapped here
//!   so `?` works across layers.

use ai_llm_service::AiLlmError;
use git_context_engine::GitContextEngineError;
use issue_context::IssueContextError;
use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type ReviewResult<T> = Result<T, Error>;

/// Root error type for the pr-reviewer crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Code host (Bitbucket) failure.
    #[error(transparent)]
    Provider(#[from] GitContextEngineError),

    /// Issue tracker (Jira) failure.
    #[error(transparent)]
    Issues(#[from] IssueContextError),

    /// Language model endpoint failure.
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    /// Invalid reviewer settings.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// HTTP status behind the failure, when a remote answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider(e) => e.status_code(),
            Self::Issues(IssueContextError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Reviewer settings errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid number in {var}: '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("invalid boolean in {var}: '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} is out of range: '{value}'")]
    OutOfRange { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}
