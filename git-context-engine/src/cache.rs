//! In-memory raw-content cache scoped to one pull request.
//!
//! Key: `(repo-relative path, git ref)`. Only successful fetches are stored,
//! so a failed load is retried the next time the same file is requested.
//! The pipeline creates a fresh cache for every PR and drops it afterwards.

use std::collections::HashMap;

/// Per-PR cache of file contents keyed by path and ref.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<(String, String), String>,
    hits: usize,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns cached text and counts the hit.
    pub fn get(&mut self, path: &str, git_ref: &str) -> Option<&str> {
        let key = (path.to_string(), git_ref.to_string());
        match self.entries.get(&key) {
            Some(text) => {
                self.hits += 1;
                Some(text.as_str())
            }
            None => None,
        }
    }

    pub fn insert(&mut self, path: &str, git_ref: &str, text: String) {
        self.entries
            .insert((path.to_string(), git_ref.to_string()), text);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from memory.
    pub fn hits(&self) -> usize {
        self.hits
    }
}
