//! Admin console gateway.
//!
//! ```text
//!   reverse proxy  ──/sn_admin/...──▶  ┌──────────────────────────────────────────┐
//!                                      │ http server (request id, trace, timeout) │
//!                                      │     │                                    │
//!                                      │     ▼                                    │
//!                                      │ strip base path → resolve under root     │
//!                                      │     │                                    │
//!                                      │     ▼                                    │
//!                                      │ rewrite cache ──miss──▶ html/js/css      │
//!                                      │     │                    rewriters       │
//!                                      │     ▼                                    │
//!   client  ◀──────────────────────────│ response (content type, cache control)   │
//!                                      └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use console_gateway::config::{load_with_overrides, ConfigWatcher, Overrides};
use console_gateway::lifecycle::{signals, Shutdown};
use console_gateway::observability::{logging, metrics};
use console_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "console-gateway")]
#[command(about = "Serve the admin console under a base path", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// URL prefix the console is mounted under (e.g. /sn_admin).
    #[arg(long)]
    base_path: Option<String>,

    /// Listen address.
    #[arg(long)]
    bind: Option<String>,

    /// Directory containing the built console.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Do not reload the configuration file when it changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let overrides = Overrides::from_env().merge(Overrides {
        base_path: args.base_path,
        bind_address: args.bind,
        asset_root: args.assets,
    });
    let config = load_with_overrides(args.config.as_deref(), &overrides)?;

    logging::init(&config.observability.log_level);
    tracing::info!("console-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.base_path,
        asset_root = %config.assets.root.display(),
        cache_enabled = config.cache.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match args.config.as_deref() {
        Some(path) if !args.no_watch => {
            let (watcher, rx) = ConfigWatcher::new(path, overrides.clone());
            match watcher.run() {
                Ok(w) => (Some(w), rx),
                Err(e) => {
                    tracing::error!(error = %e, "Config watcher failed to start, hot reload disabled");
                    (None, rx)
                }
            }
        }
        _ => {
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        trigger.trigger();
    });

    HttpServer::new(config).run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
