//! Public entry for the pr-reviewer pipeline.
//!
//! Reviews recently opened Bitbucket pull requests of an Ansible repository:
//!
//! 1) **List** open PRs and keep those created inside the time window
//! 2) **Diff** fetch per PR (empty diffs are skipped)
//! 3) **Issues**: Jira keys from title/description, followed through mentions and links
//! 4) **Context**: original file content at the target ref plus role YAML
//!    (`defaults`, `vars`, `handlers`, `meta`) for every touched role
//! 5) **Prompt** assembly with fixed block order and a hard size cap
//! 6) **LLM** call through Ollama, reasoning trace stripped
//! 7) **Comment** posted with an AI disclosure notice, unless no issues were found
//!
//! PRs are processed one after another. Everything fetched for a PR lives in a
//! per-PR [`git_context_engine::ContentCache`] that is dropped afterwards.

pub mod config;
pub mod context;
pub mod diff;
pub mod errors;
pub mod lister;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod review;
pub mod telemetry;
pub mod truncate;

pub use config::{ReviewLimits, ReviewerConfig};
pub use errors::{ConfigError, Error, ReviewResult};
pub use pipeline::{BatchReport, PrOutcome, Reviewer, Step, run_batch};
pub use telemetry::prompt_dump::PromptDumpConfig;
