//! Prompt telemetry: dumping the exact LLM prompt of each PR to disk.
//!
//! ## What it does
//! - Writes the full prompt to `<dump_dir>/pr-<id>.txt`.
//! - Redacts bearer tokens and similar secrets before writing.
//! - Emits a concise DEBUG log line (path, length).
//! - Never fails the review: I/O errors are logged and ignored.
//!
//! ## Env flags
//! - `PR_REVIEWER_DUMP_PROMPTS` (bool): enable dumping (default: false)
//! - `PR_REVIEWER_DUMP_DIR` (path): target directory (default: `code_data/prompts`)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::config::parse_bool;
use crate::errors::ReviewResult;

pub const DEFAULT_DUMP_DIR: &str = "code_data/prompts";

/// Where (and whether) prompts are dumped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDumpConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for PromptDumpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from(DEFAULT_DUMP_DIR),
        }
    }
}

impl PromptDumpConfig {
    /// Reads `PR_REVIEWER_DUMP_PROMPTS` and `PR_REVIEWER_DUMP_DIR`.
    pub fn from_env() -> ReviewResult<Self> {
        Self::from_values(
            std::env::var("PR_REVIEWER_DUMP_PROMPTS").ok(),
            std::env::var("PR_REVIEWER_DUMP_DIR").ok(),
        )
    }

    fn from_values(enabled: Option<String>, dir: Option<String>) -> ReviewResult<Self> {
        let dir = dir
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMP_DIR));
        Ok(Self {
            enabled: parse_bool("PR_REVIEWER_DUMP_PROMPTS", enabled, false)?,
            dir,
        })
    }
}

static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Redact obvious secrets (best-effort; keep it conservative).
fn redact_secrets(s: &str) -> String {
    let patterns = SECRET_PATTERNS.get_or_init(|| {
        [
            r"(?i)Authorization:\s*Bearer\s+[A-Za-z0-9\-_\.=/+]{16,}",
            r"(?i)\bBearer\s+[A-Za-z0-9\-_\.=/+]{16,}",
            r"(?i)\btoken\s*[:=]\s*[A-Za-z0-9\-_\.=/+]{16,}",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    });

    patterns.iter().fold(s.to_string(), |acc, re| {
        re.replace_all(&acc, "[REDACTED]").into_owned()
    })
}

fn dump_path(dir: &Path, pr_id: u64) -> PathBuf {
    dir.join(format!("pr-{pr_id}.txt"))
}

/// Writes the prompt for `pr_id` when dumping is enabled.
///
/// Returns the written path, or `None` when disabled or on I/O failure.
pub fn dump_prompt(cfg: &PromptDumpConfig, pr_id: u64, prompt: &str) -> Option<PathBuf> {
    if !cfg.enabled {
        return None;
    }

    let content = redact_secrets(prompt);
    let file = dump_path(&cfg.dir, pr_id);

    if let Err(e) = fs::create_dir_all(&cfg.dir).and_then(|_| fs::write(&file, &content)) {
        debug!(pr = pr_id, "prompt dump failed for {}: {e}", file.display());
        return None;
    }

    debug!(
        pr = pr_id,
        "prompt dumped file={} len={}",
        file.display(),
        content.chars().count()
    );
    Some(file)
}
