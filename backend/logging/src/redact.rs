//! Log Redaction
//!
//! Scrubs API keys, bearer tokens, e-mail addresses and phone numbers. Card
//! data is personal; none of it should reach a log file verbatim.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[A-Za-z0-9_\-]{20,})|(AIza[0-9A-Za-z_\-]{30,})|(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)").unwrap()
});
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap());
static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = EMAIL_RE.replace_all(&redacted, "[REDACTED_EMAIL]");
    TELEPHONE_RE.replace_all(&redacted, "[REDACTED_PHONE]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_phone_and_bearer_token() {
        let raw = "Calling +1-555-123-4567 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("555-123-4567"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.contains("[REDACTED_PHONE]"));
        assert!(clean.contains("[REDACTED_TOKEN]"));
    }

    #[test]
    fn scrubs_emails_and_provider_keys() {
        let raw = "jane@acme.com used sk-abcdefghijklmnopqrstuvwxyz123456 and AIzaSyA1234567890abcdefghijklmnopqrstu";
        let clean = redact_sensitive_data(raw);
        assert_eq!(
            clean,
            "[REDACTED_EMAIL] used [REDACTED_TOKEN] and [REDACTED_TOKEN]"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        let raw = "Acme Industries, 3 images";
        assert_eq!(redact_sensitive_data(raw), raw);
    }
}
