//! Review requester: one chat call per PR, reasoning trace removed.

use std::sync::OnceLock;
use std::time::Instant;

use ai_llm_service::OllamaService;
use regex::Regex;
use tracing::info;

use crate::errors::ReviewResult;

static THINK_RE: OnceLock<Regex> = OnceLock::new();

/// Removes `<think>…</think>` blocks (plus one trailing newline) and trims.
pub fn strip_reasoning_trace(text: &str) -> String {
    let re = THINK_RE
        .get_or_init(|| Regex::new(r"(?s)<think>.*?</think>\n?").expect("static think regex"));
    re.replace_all(text, "").trim().to_string()
}

/// Sends the prompt and returns the cleaned answer (possibly empty).
pub async fn request_review(llm: &OllamaService, pr_id: u64, prompt: &str) -> ReviewResult<String> {
    let t0 = Instant::now();
    let raw = llm.chat(prompt).await?;
    let cleaned = strip_reasoning_trace(&raw);
    info!(
        pr = pr_id,
        model = llm.model(),
        raw_chars = raw.len(),
        answer_chars = cleaned.len(),
        "llm: answered in {} ms",
        t0.elapsed().as_millis()
    );
    Ok(cleaned)
}
