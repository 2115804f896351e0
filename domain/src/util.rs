//! Shared text helpers for LLM output handling.

/// Truncate a string to at most `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Body of the first fenced code block tagged `lang` (case-insensitive).
///
/// An untagged fence is accepted when no tagged one exists. Returns `None`
/// when the text has no complete fence.
pub fn extract_fenced_block<'a>(text: &'a str, lang: &str) -> Option<&'a str> {
    let mut untagged = None;
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_ticks = &rest[open + 3..];
        let line_end = after_ticks.find('\n')?;
        let tag = after_ticks[..line_end].trim();
        let body_start = &after_ticks[line_end + 1..];
        let close = body_start.find("```")?;
        let body = body_start[..close].trim();

        if tag.eq_ignore_ascii_case(lang) {
            return Some(body);
        }
        if tag.is_empty() && untagged.is_none() {
            untagged = Some(body);
        }
        rest = &body_start[close + 3..];
    }
    untagged
}

/// Outermost `{...}` span in the text.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_char_boundary() {
        let s = "café au lait"; // 'é' is 2 bytes
        assert_eq!(truncate_str(s, 4), "caf");
        assert_eq!(truncate_str(s, 5), "café");
        assert_eq!(truncate_str("short", 64), "short");
    }

    #[test]
    fn fenced_block_prefers_tagged() {
        let text = "Plan:\n```\nnot this\n```\nAnswer:\n```SQL\nSELECT 1;\n```\n";
        assert_eq!(extract_fenced_block(text, "sql"), Some("SELECT 1;"));
    }

    #[test]
    fn fenced_block_falls_back_to_untagged() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_fenced_block(text, "json"), Some("{\"a\": 1}"));
    }

    #[test]
    fn fenced_block_none_when_unterminated() {
        assert_eq!(extract_fenced_block("```json\n{\"a\": 1}", "json"), None);
        assert_eq!(extract_fenced_block("no fences", "json"), None);
    }

    #[test]
    fn json_object_span() {
        assert_eq!(
            extract_json_object("Sure! {\"intent\": \"x\"} done"),
            Some("{\"intent\": \"x\"}")
        );
        assert_eq!(extract_json_object("} {"), None);
    }
}
