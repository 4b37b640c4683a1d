//! Static asset serving.
//!
//! # Responsibilities
//! - Serve ROM bytes under `/roms` as opaque binaries
//! - Serve the front-end bundle, falling back to `index.html` for client routes
//!
//! # Design Decisions
//! - ROM files never get a sniffed content type
//! - HTML documents are never cached so new bundles show up immediately

use std::path::Path;

use axum::http::{header, HeaderValue, Response};
use tower::Layer;
use tower_http::services::fs::ServeFileSystemResponseBody;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};

type HeaderFn = fn(&Response<ServeFileSystemResponseBody>) -> Option<HeaderValue>;

/// Service for `/roms/*`.
pub type RomFiles = SetResponseHeader<SetResponseHeader<ServeDir, HeaderFn>, HeaderFn>;

/// Service for the front-end bundle.
pub type FrontEnd = SetResponseHeader<ServeDir<ServeFile>, HeaderFn>;

pub fn rom_files(dir: &Path) -> RomFiles {
    let serve = ServeDir::new(dir).append_index_html_on_directories(false);
    let typed = SetResponseHeaderLayer::overriding(header::CONTENT_TYPE, octet_stream as HeaderFn)
        .layer(serve);
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, immutable as HeaderFn).layer(typed)
}

pub fn front_end(dir: &Path) -> FrontEnd {
    let serve = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, no_cache_html as HeaderFn)
        .layer(serve)
}

fn octet_stream(response: &Response<ServeFileSystemResponseBody>) -> Option<HeaderValue> {
    response
        .status()
        .is_success()
        .then(|| HeaderValue::from_static("application/octet-stream"))
}

fn immutable(response: &Response<ServeFileSystemResponseBody>) -> Option<HeaderValue> {
    response
        .status()
        .is_success()
        .then(|| HeaderValue::from_static("public, max-age=31536000, immutable"))
}

fn no_cache_html(response: &Response<ServeFileSystemResponseBody>) -> Option<HeaderValue> {
    let is_html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    is_html.then(|| HeaderValue::from_static("no-cache, no-store, must-revalidate"))
}
