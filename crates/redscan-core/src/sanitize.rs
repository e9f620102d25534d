//! Output sanitation: terminal escape stripping and bounded truncation
//!
//! Both operations are stateless and composable. Scanner output is
//! adversarial by nature (it embeds bytes from scanned targets), so neither
//! function assumes well-formed input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Covers SGR (colors), cursor movement, erase, OSC, and other sequences.
static ANSI_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x1b\x9b][\[()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-ORZcf-nqry=><~]")
        .expect("ANSI escape pattern is valid")
});

static TRUNCATION_NOTICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\n\[OUTPUT TRUNCATED: [0-9]+ characters omitted\]$")
        .expect("truncation notice pattern is valid")
});

/// Strip terminal escape and control sequences, leaving visible text.
///
/// Idempotent: `strip_ansi_codes(strip_ansi_codes(x)) == strip_ansi_codes(x)`,
/// and a no-op on text without such sequences.
pub fn strip_ansi_codes(input: &str) -> String {
    ANSI_PATTERN.replace_all(input, "").into_owned()
}

/// Truncate to at most `max_chars` characters, appending a notice stating
/// how many characters were omitted.
///
/// Input at or under the limit is returned unchanged, as is input already
/// carrying a notice over a `max_chars`-length body, so repeated application
/// with the same limit is stable.
pub fn truncate_output(input: &str, max_chars: usize) -> String {
    let total = input.chars().count();
    if total <= max_chars {
        return input.to_string();
    }
    if let Some(notice) = TRUNCATION_NOTICE.find(input) {
        if input[..notice.start()].chars().count() == max_chars {
            return input.to_string();
        }
    }
    let kept: String = input.chars().take(max_chars).collect();
    let omitted = total - max_chars;
    format!("{kept}\n\n[OUTPUT TRUNCATED: {omitted} characters omitted]")
}
