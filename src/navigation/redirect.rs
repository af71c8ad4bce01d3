//! Redirect-hint sanitization.

/// Validate an explicit redirect hint (typically a `redirect=` query
/// parameter).
///
/// Only same-origin relative paths are followed: the hint must start with
/// exactly one `/`. Absolute URLs, protocol-relative `//` forms, backslash
/// variants, and empty strings are all treated as absent — never followed,
/// never an error.
pub fn sanitize_redirect(raw: Option<&str>) -> Option<&str> {
    let raw = raw?.trim();
    if raw.is_empty() || !raw.starts_with('/') {
        return None;
    }
    // "//host" and "/\host" both navigate off-origin in browsers.
    if raw.starts_with("//") || raw.contains('\\') {
        return None;
    }
    if raw.chars().any(char::is_control) {
        return None;
    }
    Some(raw)
}
