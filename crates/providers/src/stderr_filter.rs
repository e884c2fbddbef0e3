//! Separates real errors from the runtime chatter the assistant prints on stderr.
//!
//! The assistant's runtime emits deprecation warnings and cache notices on every
//! run, often alongside a nonzero exit. Treating those as failures would make
//! every call look broken, so they are filtered out here before any decision.

use regex::RegexSet;
use std::sync::OnceLock;

static NOISE_PATTERNS: OnceLock<RegexSet> = OnceLock::new();

fn noise_patterns() -> &'static RegexSet {
    NOISE_PATTERNS.get_or_init(|| {
        RegexSet::new([
            // (node:12345) [DEP0040] DeprecationWarning: ...
            r"^\(\w+:\d+\)\s+(\[DEP\d+\]\s+)?DeprecationWarning\b",
            r"^\[DEP\d+\]\s+DeprecationWarning\b",
            // The `punycode` module is deprecated. Please use a userland alternative instead.
            r#"(?i)\bthe\s+[`'"]?[\w./@-]+[`'"]?\s+module\s+is\s+deprecated"#,
            r"(?i)loaded cached credentials|credentials loaded from cache",
            // (Use `node --trace-deprecation ...` to show where the warning was created)
            r"^\(Use\s+`?node\s+--trace-(deprecation|warnings)\b",
        ])
        .unwrap_or_else(|_| RegexSet::empty())
    })
}

/// True when `line` is known-benign runtime output.
pub fn is_noise_line(line: &str) -> bool {
    noise_patterns().is_match(line.trim())
}

/// Keep only the lines that look like real errors, trimmed and newline-joined.
///
/// Returns an empty string when the diagnostic text was noise only.
pub fn classify(diagnostic: &str) -> String {
    diagnostic
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_noise_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}
