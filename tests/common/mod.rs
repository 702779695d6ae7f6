//! Shared utilities for integration testing.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use console_gateway::config::ConsoleConfig;
use console_gateway::{HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Dashboard entry page as emitted by the bundler for base "/".
pub const DASHBOARD_HTML: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <link rel="icon" type="image/svg+xml" href="/favicon.svg" />
    <meta property="og:image" content="/og.png" />
    <script type="module" crossorigin src="/assets/dashboard-CkR2.js"></script>
    <link rel="stylesheet" crossorigin href="/assets/dashboard-B9x1.css">
    <link rel="preconnect" href="//fonts.example.com">
  </head>
  <body><div id="app"></div></body>
</html>
"#;

/// Minified chunk carrying every shape the JS rewriter depends on.
pub const DASHBOARD_JS: &str = concat!(
    r#"const Vt=function(t){return"/"+t},Wt={};"#,
    r#"const Se=location.hostname.includes("localhost")?"http://localhost:4096":window.location.origin;"#,
    r#"const Be=new Audio("/assets/nope-01.aac");"#,
    r#"fetch(Se+"/api/status").then(r=>r.json());"#,
);

pub const DASHBOARD_CSS: &str =
    "@font-face{font-family:Inter;src:url(/assets/inter.woff2) format(\"woff2\")}body{background:url(//cdn.example.com/bg.png)}";

/// Write a two-page console bundle into `root`.
pub fn write_bundle(root: &Path) {
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::create_dir_all(root.join("dashboard")).unwrap();
    fs::create_dir_all(root.join("registration")).unwrap();

    fs::write(root.join("dashboard/index.html"), DASHBOARD_HTML).unwrap();
    fs::write(
        root.join("registration/index.html"),
        r#"<html><head><script type="module" src="/assets/registration-A1.js"></script></head><body><form></form></body></html>"#,
    )
    .unwrap();
    fs::write(root.join("assets/dashboard-CkR2.js"), DASHBOARD_JS).unwrap();
    fs::write(root.join("assets/registration-A1.js"), r#"history.pushState({},"","/done")"#).unwrap();
    fs::write(root.join("assets/dashboard-B9x1.css"), DASHBOARD_CSS).unwrap();
    fs::write(root.join("assets/inter.woff2"), [0x77u8, 0x4f, 0x46, 0x32]).unwrap();
}

/// A running gateway bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<ConsoleConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start(mut config: ConsoleConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
