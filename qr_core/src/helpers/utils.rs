use std::sync::LazyLock;

use regex::Regex;

static SHORT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("short code pattern"));

static HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("url pattern"));

/// Trim a short code taken from a URL path and reject anything outside the
/// code alphabet. Storage keys rely on codes never containing `:`.
pub fn normalize_short_code(code: &str) -> Option<String> {
    let code = code.trim();
    if SHORT_CODE.is_match(code) {
        Some(code.to_string())
    } else {
        None
    }
}

pub fn is_http_url(url: &str) -> bool {
    HTTP_URL.is_match(url.trim())
}
