//! Configuration loading from disk and environment.
//!
//! Precedence, lowest first: defaults, TOML file, `CONSOLE_*` environment
//! variables, command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::basepath::BasePath;
use crate::config::schema::ConsoleConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_BASE_PATH: &str = "CONSOLE_BASE_PATH";
pub const ENV_BIND_ADDRESS: &str = "CONSOLE_BIND_ADDRESS";
pub const ENV_ASSET_ROOT: &str = "CONSOLE_ASSET_ROOT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that replace whatever the file says.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_path: Option<String>,
    pub bind_address: Option<String>,
    pub asset_root: Option<PathBuf>,
}

impl Overrides {
    /// Read the `CONSOLE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build overrides from any key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_path: lookup(ENV_BASE_PATH),
            bind_address: lookup(ENV_BIND_ADDRESS),
            asset_root: lookup(ENV_ASSET_ROOT).map(PathBuf::from),
        }
    }

    /// Layer `other` on top; its set values win.
    pub fn merge(self, other: Overrides) -> Self {
        Self {
            base_path: other.base_path.or(self.base_path),
            bind_address: other.bind_address.or(self.bind_address),
            asset_root: other.asset_root.or(self.asset_root),
        }
    }

    pub fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(base) = &self.base_path {
            config.base_path = BasePath::new(base);
        }
        if let Some(addr) = &self.bind_address {
            config.listener.bind_address = addr.clone();
        }
        if let Some(root) = &self.asset_root {
            config.assets.root = root.clone();
        }
    }
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ConsoleConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ConsoleConfig, ConfigError> {
    load_with_overrides(Some(path), &Overrides::default())
}

/// Build the effective configuration: defaults or file, then overrides, then validation.
pub fn load_with_overrides(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<ConsoleConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ConsoleConfig::default(),
    };
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
