//! Deterministic length limits for prompt material.
//!
//! All counts are in `char`s, never bytes, so multi-byte text is never split
//! inside a code point.

use std::borrow::Cow;

/// Inserted between the kept head and tail of shortened text.
pub const HEAD_TAIL_MARKER: &str = "\n\n[... truncated ...]\n\n";

/// Keeps the first `head` and last `tail` chars joined by [`HEAD_TAIL_MARKER`].
///
/// Text is left alone while it fits in `head + marker + tail` chars, which is
/// exactly the length of a shortened result. Applying the rule twice with the
/// same limits therefore changes nothing.
pub fn head_tail(text: &str, head: usize, tail: usize) -> Cow<'_, str> {
    let marker_len = HEAD_TAIL_MARKER.chars().count();
    let total = text.chars().count();
    if total <= head + tail + marker_len {
        return Cow::Borrowed(text);
    }

    let head_end = byte_offset(text, head);
    let tail_start = byte_offset(text, total - tail);

    let mut out = String::with_capacity(head_end + HEAD_TAIL_MARKER.len() + text.len() - tail_start);
    out.push_str(&text[..head_end]);
    out.push_str(HEAD_TAIL_MARKER);
    out.push_str(&text[tail_start..]);
    Cow::Owned(out)
}

/// Head+tail rule for a single budget, split three quarters head, one quarter tail.
pub fn within_budget(text: &str, max_chars: usize) -> Cow<'_, str> {
    let tail = max_chars / 4;
    head_tail(text, max_chars - tail, tail)
}

/// Cuts `text` from the end so that the result, `marker` included, is at most
/// `max_chars` long.
pub fn hard_limit(text: &str, max_chars: usize, marker: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = marker.chars().count();
    if marker_len >= max_chars {
        return marker.chars().take(max_chars).collect();
    }

    let keep = byte_offset(text, max_chars - marker_len);
    let mut out = String::with_capacity(keep + marker.len());
    out.push_str(&text[..keep]);
    out.push_str(marker);
    out
}

/// Byte index of the `n`-th char (or the end of `text`).
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_is_borrowed_unchanged() {
        assert!(matches!(head_tail("abc", 2, 2), Cow::Borrowed("abc")));
    }

    #[test]
    fn long_text_keeps_both_ends() {
        let text = "a".repeat(50) + &"b".repeat(50);
        let out = head_tail(&text, 10, 5);
        assert_eq!(out, format!("{}{}{}", "a".repeat(10), HEAD_TAIL_MARKER, "b".repeat(5)));
    }

    #[test]
    fn head_tail_is_idempotent() {
        let text: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let once = head_tail(&text, 300, 100).into_owned();
        let twice = head_tail(&once, 300, 100).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "ж".repeat(100);
        let out = head_tail(&text, 3, 2);
        assert!(out.starts_with("жжж\n"));
        assert!(out.ends_with("\nжж"));
    }

    #[test]
    fn hard_limit_never_exceeds_budget() {
        let marker = "\n[cut]";
        let out = hard_limit(&"x".repeat(100), 20, marker);
        assert_eq!(out.chars().count(), 20);
        assert!(out.ends_with(marker));

        assert_eq!(hard_limit("short", 20, marker), "short");
        assert_eq!(hard_limit(&"x".repeat(10), 3, marker), "\n[c");
    }
}
