//! Diagnostics that never affect review results.

pub mod prompt_dump;
