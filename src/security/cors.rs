//! Cross-origin request policy.
//!
//! Patterns are exact origins, or an origin ending in `:*` which matches that
//! scheme and host on any port (or none).

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build the CORS layer for the configured origin patterns.
pub fn cors_layer(patterns: &[String]) -> CorsLayer {
    let patterns = patterns.to_vec();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|origin| origin_allowed(origin, &patterns))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Whether `origin` matches any of `patterns`.
pub fn origin_allowed(origin: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| matches_pattern(origin, pattern))
}

fn matches_pattern(origin: &str, pattern: &str) -> bool {
    let Some(base) = pattern.strip_suffix(":*") else {
        return origin == pattern;
    };
    match origin.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(':')
            .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}
