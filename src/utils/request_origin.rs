use axum::http::{header, HeaderMap};

/// Origin the client signed for: the `Origin` header when the browser sent a
/// usable one, otherwise the configured public origin.
pub fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "null")
        .unwrap_or(fallback)
        .to_string()
}
