use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization:\s*(?:bearer\s+)?)([^\s,;]+)",
        r"(?i)([A-Z0-9_]*?(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
        r#"(?i)("(?:authorization|edc:authorization|https://w3id\.org/edc/v0\.0\.1/ns/authorization|authCode|edc:authCode|edrToken|token|x-api-key)"\s*:\s*")([^"]*)"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Covers `Authorization:` header lines, `NAME_TOKEN=value` pairs and JSON
/// fields that carry EDR authorization values.
///
/// # Example
/// ```rust
/// use infergate_util::redact_sensitive;
///
/// let line = redact_sensitive("Authorization: Bearer abc.def");
/// assert_eq!(line, "Authorization: Bearer <redacted>");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &Captures| {
                let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>")
            })
            .to_string();
    }
    redacted
}
