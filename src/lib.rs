//! Admin console gateway.
//!
//! Serves a built HTML/CSS/JS console bundle under a configurable base path,
//! rewriting root-absolute references in each asset as it is emitted.

// Rewriting engine
pub mod basepath;
pub mod rewrite;

// Serving
pub mod assets;
pub mod config;
pub mod http;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use basepath::BasePath;
pub use config::ConsoleConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
