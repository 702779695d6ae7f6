use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::assets::{self, CacheStats};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub base_path: String,
    pub asset_root: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct PurgeResult {
    pub evicted: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshot = state.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        base_path: snapshot.config.base_path.as_str().to_string(),
        asset_root: snapshot.store.root().display().to_string(),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

pub async fn purge_cache(State(state): State<AppState>) -> Json<PurgeResult> {
    Json(PurgeResult {
        evicted: state.cache.purge(),
    })
}

/// Dry-run the rewriters over the whole bundle with the active base path.
pub async fn get_drift(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.snapshot();
    let result = tokio::task::spawn_blocking(move || {
        assets::scan(&snapshot.store, &snapshot.config.base_path)
    })
    .await;

    match result {
        Ok(Ok(report)) => {
            if report.has_scripts() && !report.js_patched() {
                tracing::warn!("No script in the bundle matched the origin or asset base patterns");
            }
            (StatusCode::OK, Json(report)).into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to scan assets: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to scan assets").into_response()
        }
        Err(e) => {
            tracing::error!("Drift scan task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to scan assets").into_response()
        }
    }
}
