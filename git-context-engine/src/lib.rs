//! Code host access for the review bot.
//!
//! * [`git_providers`]: Bitbucket Server client and the host-agnostic types
//! * [`parser`]: unified diff splitting into per-file blocks
//! * [`cache`]: per-PR raw-content cache

pub mod cache;
pub mod errors;
pub mod git_providers;
pub mod parser;

pub use cache::ContentCache;
pub use errors::{
    GitContextEngineConfigError, GitContextEngineError, GitContextEngineProviderError,
    GitContextEngineResult,
};
pub use git_providers::{
    BitbucketClient, BrowsePage, DirEntry, EntryKind, FileDiff, ProviderConfig,
    PullRequestSummary,
};
pub use parser::split_file_diffs;
