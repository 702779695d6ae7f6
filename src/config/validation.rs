//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject prefixes that cannot be embedded in URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConsoleConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ConsoleConfig, PLACEHOLDER_API_KEY};

/// Characters the rewriters cannot embed raw into attributes, string literals
/// or `url(...)`, plus URL delimiters.
const UNSAFE_BASE_PATH_CHARS: &[char] = &['?', '#', '"', '\'', '`', '<', '>', '\\', '(', ')'];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("base path `{0}` contains characters not allowed in a URL path prefix")]
    InvalidBasePath(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("cache.max_entries must be greater than zero when the cache is enabled")]
    ZeroCacheCapacity,

    #[error("assets.index_file must be a plain file name, got `{0}`")]
    InvalidIndexFile(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let base = config.base_path.as_str();
    if base.chars().any(|c| UNSAFE_BASE_PATH_CHARS.contains(&c) || c.is_whitespace()) {
        errors.push(ValidationError::InvalidBasePath(base.to_string()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.cache.enabled && config.cache.max_entries == 0 {
        errors.push(ValidationError::ZeroCacheCapacity);
    }

    let index = &config.assets.index_file;
    if index.is_empty() || index.contains('/') || index.contains('\\') || index == ".." {
        errors.push(ValidationError::InvalidIndexFile(index.clone()));
    }

    if config.admin.enabled {
        let key = config.admin.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basepath::BasePath;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&ConsoleConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ConsoleConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.cache.max_entries = 0;
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::ZeroCacheCapacity));
        assert!(errors.contains(&ValidationError::MissingAdminKey));
    }

    #[test]
    fn test_rejects_query_in_base_path() {
        let mut config = ConsoleConfig::default();
        config.base_path = BasePath::new("/admin?x=1");
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidBasePath("/admin?x=1".into())]);
    }

    #[test]
    fn test_rejects_quotes_and_markup_in_base_path() {
        for raw in ["/a\"b", "/a'b", "/a<b", "/a>b", "/a\\b", "/a(b", "/a)b", "/a`b"] {
            let mut config = ConsoleConfig::default();
            config.base_path = BasePath::new(raw);
            assert!(
                matches!(validate_config(&config).unwrap_err()[..], [ValidationError::InvalidBasePath(_)]),
                "{raw} accepted"
            );
        }

        let mut config = ConsoleConfig::default();
        config.base_path = BasePath::new("/sn_admin-v2.1_x");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_nested_index_file() {
        let mut config = ConsoleConfig::default();
        config.assets.index_file = "pages/index.html".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = ConsoleConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
