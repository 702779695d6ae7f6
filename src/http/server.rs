//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Apply configuration updates without dropping connections
//! - Graceful shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin;
use crate::assets::{AssetStore, RewriteCache};
use crate::config::ConsoleConfig;
use crate::http::handler::{health, serve_asset};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown;

/// Everything derived from one configuration generation.
#[derive(Debug)]
pub struct Snapshot {
    pub config: ConsoleConfig,
    pub store: AssetStore,
}

impl Snapshot {
    pub fn new(config: ConsoleConfig) -> Self {
        let store = AssetStore::new(&config.assets);
        Self { config, store }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Snapshot>>,
    pub cache: RewriteCache,
    pub started: Instant,
}

impl AppState {
    pub fn new(config: ConsoleConfig) -> Self {
        let cache = RewriteCache::new(config.cache.max_entries);
        Self {
            inner: Arc::new(ArcSwap::from_pointee(Snapshot::new(config))),
            cache,
            started: Instant::now(),
        }
    }

    /// Swap in a new configuration.
    ///
    /// A base path change purges the rewrite cache. Listener, admin, cache
    /// capacity, timeout and observability settings only take effect after
    /// a restart.
    pub fn apply(&self, config: ConsoleConfig) {
        let previous = self.inner.load_full();

        for setting in restart_required(&previous.config, &config) {
            tracing::warn!(setting, "Setting change requires a restart");
        }

        let base_changed = previous.config.base_path != config.base_path;
        let from = previous.config.base_path.clone();
        let to = config.base_path.clone();

        self.inner.store(Arc::new(Snapshot::new(config)));

        if base_changed {
            let evicted = self.cache.purge();
            tracing::info!(from = %from, to = %to, evicted, "Base path changed");
        } else {
            tracing::info!(base_path = %to, "Configuration reloaded");
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }
}

/// Settings that are fixed at startup and differ between `current` and `requested`.
pub fn restart_required(current: &ConsoleConfig, requested: &ConsoleConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if current.listener.bind_address != requested.listener.bind_address {
        changed.push("listener.bind_address");
    }
    if current.admin.enabled != requested.admin.enabled {
        changed.push("admin.enabled");
    }
    if current.cache.max_entries != requested.cache.max_entries {
        changed.push("cache.max_entries");
    }
    if current.timeouts.request_secs != requested.timeouts.request_secs {
        changed.push("timeouts.request_secs");
    }
    if current.observability != requested.observability {
        changed.push("observability");
    }
    changed
}

/// HTTP server for the console.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ConsoleConfig) -> Self {
        let state = AppState::new(config);
        let router = Self::build_router(&state);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: &AppState) -> Router {
        let snapshot = state.snapshot();
        let config = &snapshot.config;

        let mut router = Router::new()
            .route("/healthz", get(health))
            .fallback(serve_asset)
            .with_state(state.clone());

        if config.admin.enabled {
            tracing::info!("Admin API enabled");
            router = router.merge(admin::setup_admin_router(state.clone()));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` are applied live.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ConsoleConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let snapshot = self.state.snapshot();
        tracing::info!(
            address = %addr,
            base_path = %snapshot.config.base_path,
            asset_root = %snapshot.store.root().display(),
            "HTTP server starting"
        );

        let state = self.state.clone();
        let updates = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                state.apply(config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::recv(shutdown))
            .await?;

        updates.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{CacheKey, CachedAsset};
    use crate::basepath::BasePath;
    use crate::rewrite::RewriteReport;
    use axum::body::Bytes;

    #[test]
    fn test_apply_purges_cache_on_base_change() {
        let mut config = ConsoleConfig::default();
        config.base_path = BasePath::new("/a");
        let state = AppState::new(config.clone());

        state.cache.insert(
            CacheKey::new(&BasePath::new("/a"), "x.js"),
            CachedAsset {
                body: Bytes::new(),
                report: RewriteReport::default(),
                source_len: 0,
                source_modified: None,
            },
        );

        // Same base path: cache kept.
        state.apply(config.clone());
        assert_eq!(state.cache.len(), 1);

        config.base_path = BasePath::new("/b");
        state.apply(config);
        assert!(state.cache.is_empty());
        assert_eq!(state.snapshot().config.base_path.as_str(), "/b");
    }

    #[test]
    fn test_restart_required_settings() {
        let current = ConsoleConfig::default();
        let mut requested = current.clone();
        requested.base_path = BasePath::new("/moved");
        assert!(restart_required(&current, &requested).is_empty());

        requested.cache.max_entries = 8;
        requested.timeouts.request_secs = 5;
        requested.observability.log_level = "debug".into();
        assert_eq!(
            restart_required(&current, &requested),
            vec!["cache.max_entries", "timeouts.request_secs", "observability"]
        );

        // The live cache keeps its startup capacity.
        let state = AppState::new(current);
        state.apply(requested);
        assert_eq!(state.cache.stats().capacity, 1024);
    }
}
