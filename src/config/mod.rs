//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, base path normalized by serde)
//!     → CONSOLE_* env vars, then CLI flags (Overrides)
//!     → validation.rs (semantic checks)
//!     → ConsoleConfig (validated, immutable)
//!     → shared via Arc to the server
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config, re-applies overrides
//!     → validation.rs validates
//!     → atomic swap of Arc<ConsoleConfig> in the server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_with_overrides, ConfigError, Overrides};
pub use schema::{AdminConfig, AssetsConfig, CacheConfig, ConsoleConfig, ListenerConfig, ObservabilityConfig};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
