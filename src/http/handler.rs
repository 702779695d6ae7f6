//! Asset and health handlers.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, Method, Request},
    response::{IntoResponse, Response},
};

use crate::assets::{self, AssetError, CacheKey, CachedAsset};
use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn health() -> &'static str {
    "ok"
}

/// Serve a file from the console bundle, rewritten for the active base path.
///
/// The request may arrive with the base path still on it or already stripped
/// by the fronting proxy; both resolve to the same file.
pub async fn serve_asset(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, _body) = request.into_parts();
    let response = serve(&state, &parts).await;
    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn serve(state: &AppState, request: &Parts) -> Response {
    let snapshot = state.snapshot();
    let base = &snapshot.config.base_path;
    let request_id = request_id(&request.headers);
    let path = request.uri.path();

    // A path under the prefix is always read as prefixed, even when the
    // prefix also names a bundle directory.
    let mut prefixed = !base.is_root();
    let rel = match base.strip(path) {
        Some("") => {
            let location = match request.uri.query() {
                Some(q) => format!("{}/?{q}", base.as_str()),
                None => format!("{}/", base.as_str()),
            };
            return response::redirect(&location);
        }
        Some(rest) => rest,
        None => {
            prefixed = false;
            path
        }
    };

    if rel == "/healthz" {
        return health().await.into_response();
    }

    if request.method != Method::GET && request.method != Method::HEAD {
        return response::method_not_allowed();
    }

    let asset = match snapshot.store.resolve(rel).await {
        Ok(asset) => asset,
        Err(AssetError::Forbidden(p)) => {
            tracing::warn!(request_id = %request_id, path = %p, "Rejected path outside asset root");
            return response::not_found();
        }
        Err(e) => {
            tracing::debug!(request_id = %request_id, path = %path, error = %e, "Asset not found");
            return response::not_found();
        }
    };

    let cacheable = snapshot.config.cache.enabled && asset.kind.is_rewritable() && !base.is_root();
    let key = CacheKey::new(base, asset.key.clone());

    if cacheable {
        if let Some(hit) = state.cache.get(&key, asset.len, asset.modified) {
            tracing::trace!(request_id = %request_id, path = %asset.key, "Rewrite cache hit");
            return response::asset(&asset, hit.body, prefixed);
        }
    }

    let raw = match snapshot.store.read(&asset).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to read asset");
            return response::internal_error();
        }
    };

    let (body, report) = assets::render(&asset, raw, base);

    if cacheable {
        state.cache.insert(
            key,
            CachedAsset {
                body: body.clone(),
                report,
                source_len: asset.len,
                source_modified: asset.modified,
            },
        );
    }

    tracing::debug!(
        request_id = %request_id,
        path = %asset.key,
        bytes = body.len(),
        "Serving asset"
    );
    response::asset(&asset, body, prefixed)
}
