//! Crate-wide error hierarchy for git-context-engine.

use thiserror::Error;

/// Convenient alias for crate-wide results.
pub type GitContextEngineResult<T> = Result<T, GitContextEngineError>;

/// Root error type for the git-context-engine crate.
#[derive(Debug, Error)]
pub enum GitContextEngineError {
    /// Code host related failure.
    #[error(transparent)]
    Provider(#[from] GitContextEngineProviderError),

    /// Configuration problems (missing token, base URL, etc.).
    #[error(transparent)]
    Config(#[from] GitContextEngineConfigError),

    /// Input validation errors (bad ids, unparsable timestamps, etc.).
    #[error("validation error: {0}")]
    Validation(String),
}

impl GitContextEngineError {
    /// HTTP status behind the failure, when the host answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Provider(p) => p.status_code(),
            _ => None,
        }
    }
}

/// Provider-specific error used inside the provider layer.
#[derive(Debug, Error)]
pub enum GitContextEngineProviderError {
    /// Unauthorized (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden (HTTP 403).
    #[error("forbidden")]
    Forbidden,

    /// Not found (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Rate limited (HTTP 429).
    #[error("rate limited")]
    RateLimited,

    /// Gateway / server error (HTTP 5xx).
    #[error("server error: status {0}")]
    Server(u16),

    /// Other HTTP status (non-2xx) not covered by specific variants.
    #[error("http status error: status {0}")]
    HttpStatus(u16),

    /// Timeout at transport level.
    #[error("timeout")]
    Timeout,

    /// Network/transport failure without HTTP status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected/invalid shape of provider response.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl GitContextEngineProviderError {
    /// Numeric HTTP status for status-derived variants.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::RateLimited => Some(429),
            Self::Server(code) | Self::HttpStatus(code) => Some(*code),
            Self::Timeout | Self::Network(_) | Self::InvalidResponse(_) => None,
        }
    }
}

/// Configuration and setup errors (base API URL, missing token, etc.).
#[derive(Debug, Error)]
pub enum GitContextEngineConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// Invalid base API URL.
    #[error("invalid base api url: {0}")]
    InvalidBaseUrl(String),

    /// A numeric variable failed to parse.
    #[error("invalid number in {0}")]
    InvalidNumber(&'static str),
}

// ===== Conversions for `?` ergonomics at the crate root =====

impl From<reqwest::Error> for GitContextEngineError {
    fn from(e: reqwest::Error) -> Self {
        GitContextEngineError::Provider(GitContextEngineProviderError::from(e))
    }
}

// ===== Mapping from reqwest::Error into GitContextEngineProviderError =====

impl From<reqwest::Error> for GitContextEngineProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return GitContextEngineProviderError::Timeout;
        }

        if let Some(status) = e.status() {
            return Self::from_status(status.as_u16());
        }

        if e.is_decode() {
            return GitContextEngineProviderError::InvalidResponse(e.to_string());
        }

        GitContextEngineProviderError::Network(e.to_string())
    }
}

impl GitContextEngineProviderError {
    /// Maps a non-2xx status code onto the matching variant.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => GitContextEngineProviderError::Unauthorized,
            403 => GitContextEngineProviderError::Forbidden,
            404 => GitContextEngineProviderError::NotFound,
            429 => GitContextEngineProviderError::RateLimited,
            500..=599 => GitContextEngineProviderError::Server(code),
            _ => GitContextEngineProviderError::HttpStatus(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_variants() {
        for code in [401u16, 403, 404, 429, 502, 409] {
            assert_eq!(
                GitContextEngineProviderError::from_status(code).status_code(),
                Some(code)
            );
        }
        assert_eq!(GitContextEngineProviderError::Timeout.status_code(), None);
    }

    #[test]
    fn root_error_exposes_provider_status() {
        let err = GitContextEngineError::from(GitContextEngineProviderError::NotFound);
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(
            GitContextEngineError::Validation("x".into()).status_code(),
            None
        );
    }
}
