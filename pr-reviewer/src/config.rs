//! Reviewer settings loaded from the environment.
//!
//! # Environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `PR_WINDOW_HOURS` | `2` |
//! | `PR_LIST_LIMIT` | `99` |
//! | `DIFF_CONTEXT_LINES` | `10` |
//! | `ISSUE_DESCRIPTION_MAX_CHARS` | `2000` |
//! | `FILE_HEAD_CHARS` / `FILE_TAIL_CHARS` | `6000` / `2000` |
//! | `DIFF_HEAD_CHARS` / `DIFF_TAIL_CHARS` | `8000` / `2000` |
//! | `ROLE_FILE_HEAD_CHARS` / `ROLE_FILE_TAIL_CHARS` | `3000` / `1000` |
//! | `MAX_ROLES` / `MAX_ROLE_FILES` / `BROWSE_PAGE_SIZE` | `8` / `30` / `100` |
//! | `MAX_PROMPT_CHARS` / `MAX_COMMENT_CHARS` | `90000` / `30000` |
//! | `PR_REVIEWER_DRY_RUN` | `false` |
//!
//! Code host, issue tracker and model settings are read by their own crates.

use std::str::FromStr;

use ai_llm_service::{LlmModelConfig, config_ollama_review};
use chrono::TimeDelta;
use git_context_engine::ProviderConfig;
use issue_context::JiraConfig;

use crate::errors::{ConfigError, ReviewResult};
use crate::telemetry::prompt_dump::PromptDumpConfig;

/// Every size and count cap applied while building a review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLimits {
    pub issue_description_max_chars: usize,
    pub file_head_chars: usize,
    pub file_tail_chars: usize,
    pub diff_head_chars: usize,
    pub diff_tail_chars: usize,
    pub role_file_head_chars: usize,
    pub role_file_tail_chars: usize,
    /// Touched roles expanded per PR (sorted order).
    pub max_roles: usize,
    /// YAML files loaded per role across all of its subdirectories.
    pub max_role_files: usize,
    pub browse_page_size: u32,
    pub max_prompt_chars: usize,
    pub max_comment_chars: usize,
}

impl Default for ReviewLimits {
    fn default() -> Self {
        Self {
            issue_description_max_chars: 2_000,
            file_head_chars: 6_000,
            file_tail_chars: 2_000,
            diff_head_chars: 8_000,
            diff_tail_chars: 2_000,
            role_file_head_chars: 3_000,
            role_file_tail_chars: 1_000,
            max_roles: 8,
            max_role_files: 30,
            browse_page_size: 100,
            max_prompt_chars: 90_000,
            max_comment_chars: 30_000,
        }
    }
}

impl ReviewLimits {
    /// Defaults overridden by any variable that is set.
    pub fn from_env() -> ReviewResult<Self> {
        let d = Self::default();
        Ok(Self {
            issue_description_max_chars: env_parse(
                "ISSUE_DESCRIPTION_MAX_CHARS",
                d.issue_description_max_chars,
            )?,
            file_head_chars: env_parse("FILE_HEAD_CHARS", d.file_head_chars)?,
            file_tail_chars: env_parse("FILE_TAIL_CHARS", d.file_tail_chars)?,
            diff_head_chars: env_parse("DIFF_HEAD_CHARS", d.diff_head_chars)?,
            diff_tail_chars: env_parse("DIFF_TAIL_CHARS", d.diff_tail_chars)?,
            role_file_head_chars: env_parse("ROLE_FILE_HEAD_CHARS", d.role_file_head_chars)?,
            role_file_tail_chars: env_parse("ROLE_FILE_TAIL_CHARS", d.role_file_tail_chars)?,
            max_roles: env_parse("MAX_ROLES", d.max_roles)?,
            max_role_files: env_parse("MAX_ROLE_FILES", d.max_role_files)?,
            browse_page_size: env_positive("BROWSE_PAGE_SIZE", d.browse_page_size)?,
            max_prompt_chars: env_positive("MAX_PROMPT_CHARS", d.max_prompt_chars)?,
            max_comment_chars: env_positive("MAX_COMMENT_CHARS", d.max_comment_chars)?,
        })
    }
}

/// Everything one batch run needs.
#[derive(Debug, Clone)]
pub struct ReviewerConfig {
    pub provider: ProviderConfig,
    /// `None` disables issue context.
    pub jira: Option<JiraConfig>,
    pub llm: LlmModelConfig,
    pub limits: ReviewLimits,
    /// PRs created within this window before now are reviewed.
    pub window: TimeDelta,
    pub list_limit: u32,
    pub diff_context_lines: u32,
    /// Log the would-be comment instead of posting it.
    pub dry_run: bool,
    pub prompt_dump: PromptDumpConfig,
}

impl ReviewerConfig {
    pub fn from_env() -> ReviewResult<Self> {
        let window = window_from_hours(env_positive("PR_WINDOW_HOURS", 2)?)?;
        Ok(Self {
            provider: ProviderConfig::from_env()?,
            jira: JiraConfig::from_env()?,
            llm: config_ollama_review()?,
            limits: ReviewLimits::from_env()?,
            window,
            list_limit: env_positive("PR_LIST_LIMIT", 99)?,
            diff_context_lines: env_parse("DIFF_CONTEXT_LINES", 10)?,
            dry_run: env_bool("PR_REVIEWER_DRY_RUN", false)?,
            prompt_dump: PromptDumpConfig::from_env()?,
        })
    }
}

fn window_from_hours(hours: i64) -> ReviewResult<TimeDelta> {
    TimeDelta::try_hours(hours).ok_or_else(|| {
        ConfigError::OutOfRange {
            var: "PR_WINDOW_HOURS",
            value: hours.to_string(),
        }
        .into()
    })
}

fn env_parse<T: FromStr>(var: &'static str, default: T) -> ReviewResult<T> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|_| {
            ConfigError::InvalidNumber {
                var,
                value: v.clone(),
            }
            .into()
        }),
        _ => Ok(default),
    }
}

fn env_positive<T: FromStr + Default + PartialOrd>(var: &'static str, default: T) -> ReviewResult<T> {
    let value = env_parse(var, default)?;
    if value <= T::default() {
        return Err(ConfigError::Zero { var }.into());
    }
    Ok(value)
}

fn env_bool(var: &'static str, default: bool) -> ReviewResult<bool> {
    parse_bool(var, std::env::var(var).ok(), default)
}

/// Parses a boolean setting; unset or blank means `default`.
pub(crate) fn parse_bool(
    var: &'static str,
    raw: Option<String>,
    default: bool,
) -> ReviewResult<bool> {
    match raw {
        Some(v) if !v.trim().is_empty() => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { var, value: v }.into()),
        },
        _ => Ok(default),
    }
}
