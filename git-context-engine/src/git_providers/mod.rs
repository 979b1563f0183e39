//! Code host facade.
//!
//! Only Bitbucket Server is wired in. [`ProviderConfig`] is loaded from the
//! environment and turned into a [`BitbucketClient`] bound to one repository.

pub mod types;
pub use types::*;

pub mod bitbucket;
pub use bitbucket::BitbucketClient;

use std::time::Duration;

use tracing::debug;

use crate::errors::{GitContextEngineConfigError, GitContextEngineResult};

/// Runtime configuration for the code host client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Server base, e.g. "https://bitbucket.example.com".
    pub base_api: String,
    /// Project key, e.g. "OPS".
    pub project: String,
    /// Repository slug, e.g. "ansible".
    pub repo: String,
    /// Static access token sent as a bearer token.
    pub token: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Reads `BITBUCKET_BASE_URL`, `BITBUCKET_PROJECT`, `BITBUCKET_REPO`,
    /// `BITBUCKET_TOKEN` and the optional `HTTP_TIMEOUT_SECS` (default 30).
    pub fn from_env() -> GitContextEngineResult<Self> {
        let base_api = must_env("BITBUCKET_BASE_URL")?;
        if !(base_api.starts_with("http://") || base_api.starts_with("https://")) {
            return Err(GitContextEngineConfigError::InvalidBaseUrl(base_api).into());
        }

        let timeout_secs = match std::env::var("HTTP_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => v
                .trim()
                .parse()
                .map_err(|_| GitContextEngineConfigError::InvalidNumber("HTTP_TIMEOUT_SECS"))?,
            _ => 30,
        };

        Ok(Self {
            base_api,
            project: must_env("BITBUCKET_PROJECT")?,
            repo: must_env("BITBUCKET_REPO")?,
            token: must_env("BITBUCKET_TOKEN")?,
            timeout_secs,
        })
    }

    /// Builds the HTTP client and binds it to the configured repository.
    pub fn client(&self) -> GitContextEngineResult<BitbucketClient> {
        debug!(
            "Initializing provider client: base_api={}, project={}, repo={}",
            self.base_api, self.project, self.repo
        );

        let http = reqwest::Client::builder()
            .user_agent("pr-review-bot/0.1")
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        Ok(BitbucketClient::new(
            http,
            &self.base_api,
            &self.project,
            &self.repo,
            self.token.clone(),
        ))
    }
}

fn must_env(name: &'static str) -> GitContextEngineResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(GitContextEngineConfigError::MissingVar(name).into()),
    }
}
