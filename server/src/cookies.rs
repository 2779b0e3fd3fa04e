use axum::http::{HeaderMap, header::COOKIE};
use cookie::Cookie;

/// Rebuilds the caller's cookies as a single `Cookie` header value for the
/// validation service. Malformed pairs are dropped. Returns `None` when no
/// cookie survives.
pub(crate) fn forwarded_cookie_header(headers: &HeaderMap) -> Option<String> {
    let pairs: Vec<String> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .filter(|cookie| !cookie.name().is_empty())
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}
