//! Order engine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `BOOKSTORE_DB_PATH` | `./bookstore.db` (`:memory:` for a private in-memory store) |
//! | `BOOKSTORE_MAX_CONNECTIONS` | `5` |
//! | `BOOKSTORE_ACQUIRE_TIMEOUT_SECS` | `30` |
//! | `BOOKSTORE_PENDING_TTL_SECS` | `0` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use bookstore_db::DbConfig;
use serde::{Deserialize, Serialize};

const IN_MEMORY_PATH: &str = ":memory:";

/// Order engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookstoreConfig {
    /// SQLite database file path
    pub database_path: PathBuf,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Added to the creation time to form a new order's expiry marker.
    /// Zero marks the order as expiring the moment it is created.
    pub pending_ttl: Duration,
}

impl Default for BookstoreConfig {
    fn default() -> Self {
        BookstoreConfig {
            database_path: PathBuf::from("./bookstore.db"),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            pending_ttl: Duration::ZERO,
        }
    }
}

impl BookstoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = BookstoreConfig::default();

        let config = BookstoreConfig {
            database_path: lookup("BOOKSTORE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "BOOKSTORE_MAX_CONNECTIONS", defaults.max_connections)?,

            acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "BOOKSTORE_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout.as_secs(),
            )?),

            pending_ttl: Duration::from_secs(parse_or(
                &lookup,
                "BOOKSTORE_PENDING_TTL_SECS",
                defaults.pending_ttl.as_secs(),
            )?),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("BOOKSTORE_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        BookstoreConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            ..BookstoreConfig::default()
        }
    }

    /// Sets the pending order time-to-live.
    pub fn pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    /// Builds the storage adapter configuration.
    pub fn to_db_config(&self) -> DbConfig {
        let base = if self.database_path.as_os_str() == IN_MEMORY_PATH {
            DbConfig::in_memory()
        } else {
            DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
        };
        base.connect_timeout(self.acquire_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = BookstoreConfig::load_from(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./bookstore.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.pending_ttl, Duration::ZERO);
    }

    #[test]
    fn test_overrides() {
        let config = BookstoreConfig::load_from(lookup(&[
            ("BOOKSTORE_DB_PATH", "/tmp/shop.db"),
            ("BOOKSTORE_MAX_CONNECTIONS", "12"),
            ("BOOKSTORE_ACQUIRE_TIMEOUT_SECS", "3"),
            ("BOOKSTORE_PENDING_TTL_SECS", " 900 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.pending_ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = BookstoreConfig::load_from(lookup(&[("BOOKSTORE_PENDING_TTL_SECS", "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key) if key == "BOOKSTORE_PENDING_TTL_SECS"));

        let err = BookstoreConfig::load_from(lookup(&[("BOOKSTORE_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_in_memory_maps_to_in_memory_db() {
        assert!(BookstoreConfig::in_memory().to_db_config().is_in_memory());

        let on_disk = BookstoreConfig::default().to_db_config();
        assert!(!on_disk.is_in_memory());
        assert_eq!(on_disk.max_connections, 5);
    }
}
