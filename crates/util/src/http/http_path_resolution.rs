use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes left as-is in a path segment: RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Joins a base URL and a caller path with exactly one separating slash.
///
/// A single trailing slash on `base` is dropped. An empty (or `/`) path yields
/// the trimmed base; otherwise the path is prefixed with `/` when missing.
///
/// # Examples
/// ```rust
/// use infergate_util::http::join_url;
///
/// assert_eq!(join_url("http://h/base/", "/v1/x"), "http://h/base/v1/x");
/// assert_eq!(join_url("http://h/base", "v1/x"), "http://h/base/v1/x");
/// assert_eq!(join_url("http://h/base/", ""), "http://h/base");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    let trimmed_base = base.strip_suffix('/').unwrap_or(base);
    let trimmed_path = path.trim();
    if trimmed_path.is_empty() || trimmed_path == "/" {
        return trimmed_base.to_string();
    }
    if trimmed_path.starts_with('/') {
        format!("{trimmed_base}{trimmed_path}")
    } else {
        format!("{trimmed_base}/{trimmed_path}")
    }
}

/// Percent-encodes a value so it occupies exactly one path segment.
///
/// Unreserved bytes (`A-Z`, `a-z`, `0-9`, `-`, `.`, `_`, `~`) are emitted as-is;
/// everything else, including `/`, is percent-encoded with uppercase hex.
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}

/// Replaces `{name}` placeholders in `template` with encoded segment values.
///
/// Placeholders without a matching variable are left unchanged.
pub fn build_path(template: &str, variables: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (name, value) in variables {
        path = path.replace(&format!("{{{name}}}"), &encode_path_segment(value));
    }
    path
}
