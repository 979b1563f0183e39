//! Process-wide `tracing` subscriber for the review bot.

use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{EnvFilter, fmt};

/// Used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Installs a compact single-line subscriber filtered by `RUST_LOG`.
///
/// Logs go to stderr; ANSI colors only when stderr is a terminal.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = fmt()
        .with_env_filter(filter)
        .with_timer(ChronoRfc3339Utc)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .compact()
        .try_init();

    if let Err(e) = installed {
        eprintln!("tracing subscriber already installed: {e}");
    }
}
