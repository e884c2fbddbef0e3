/// Appended after text cut by [`truncate`].
pub const TRUNCATION_MARKER: &str = "\n[… truncated]";

/// Bound `text` to `limit` characters, appending [`TRUNCATION_MARKER`] when cut.
///
/// Counts chars rather than bytes so multi-byte text is never split mid code point.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("", 0), "");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[test]
    fn test_long_text_cut_with_marker() {
        let out = truncate("abcdefghij", 4);
        assert_eq!(out, format!("abcd{}", TRUNCATION_MARKER));
        assert_eq!(
            out.chars().count(),
            4 + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_multibyte_boundary() {
        let out = truncate("Grüße aus Köln", 4);
        assert!(out.starts_with("Grüß"));
        assert_eq!(
            out.chars().count(),
            4 + TRUNCATION_MARKER.chars().count()
        );
    }
}
