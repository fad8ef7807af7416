use once_cell::sync::Lazy;
use regex::Regex;

pub const REDACTION_MARKER: &str = "[REDACTED]";

// Digit classes and word boundaries are ASCII-only: non-Latin numerals are
// left alone, and PII directly adjacent to non-ASCII letters still matches.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)[0-9]{3}[-.]?[0-9]{3}[-.]?[0-9]{4}(?-u:\b)")
        .expect("Phone regex pattern is valid")
});

static SSN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)[0-9]{3}-[0-9]{2}-[0-9]{4}(?-u:\b)").expect("SSN regex pattern is valid")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u:\b)[A-Za-z0-9_.-]+@[A-Za-z0-9_.-]+\.[A-Za-z0-9_]+(?-u:\b)")
        .expect("Email regex pattern is valid")
});

/// Replace PII-looking spans with [`REDACTION_MARKER`].
///
/// Passes run in a fixed order: phone numbers, SSNs, then emails. Each pass
/// replaces every non-overlapping match of its pattern in the output of the
/// previous pass.
pub fn redact(text: &str) -> String {
    [&*PHONE_PATTERN, &*SSN_PATTERN, &*EMAIL_PATTERN]
        .iter()
        .fold(text.to_string(), |acc, pattern| {
            pattern.replace_all(&acc, REDACTION_MARKER).into_owned()
        })
}
