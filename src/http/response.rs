//! Response construction for served assets.
//!
//! # Design Decisions
//! - HTML is revalidated on every load so a new base path or build takes effect
//! - Hashed files under `assets/` are immutable, except rewritten output
//!   reached through a URL that does not carry the base path
//! - Error bodies are plain text

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::assets::{mime, ResolvedAsset};
use crate::rewrite::ContentKind;

pub const CACHE_NO_CACHE: &str = "no-cache";
pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Cache-Control value for an asset key.
///
/// `prefixed` is true when the request URL carried a non-root base path.
/// Rewritten bodies depend on the base path, so without it in the URL they
/// must be revalidated.
pub fn cache_control(key: &str, kind: ContentKind, prefixed: bool) -> &'static str {
    if kind == ContentKind::Html || !key.starts_with("assets/") {
        return CACHE_NO_CACHE;
    }
    if kind.is_rewritable() && !prefixed {
        return CACHE_NO_CACHE;
    }
    CACHE_IMMUTABLE
}

pub fn asset(asset: &ResolvedAsset, body: Bytes, prefixed: bool) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(mime::from_path(&asset.file)),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control(&asset.key, asset.kind, prefixed)),
    );
    response
}

/// 308 to `location`, keeping the method.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::PERMANENT_REDIRECT, [(header::LOCATION, value)]).into_response(),
        Err(_) => not_found(),
    }
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

pub fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
        "405 Method Not Allowed",
    )
        .into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
}
