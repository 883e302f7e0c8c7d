// String helpers shared by the engine and anything consuming classifier output.

/// The classifier sometimes writes the literal string "null" instead of JSON null.
pub fn clean_null_placeholder(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().eq_ignore_ascii_case("null"))
}

/// Removes a surrounding Markdown code fence (optionally tagged `json`) from a reply.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let inner = trimmed.trim_matches('`');
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_null_placeholder() {
        assert_eq!(clean_null_placeholder(Some("NULL ".into())), None);
        assert_eq!(clean_null_placeholder(Some("revenue".into())), Some("revenue".into()));
        assert_eq!(clean_null_placeholder(None), None);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"b\":2} "), "{\"b\":2}");
    }
}
