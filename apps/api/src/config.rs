//! API server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use steel_db::DbConfig;

/// Secret used when `JWT_SECRET` is unset. Development only.
pub const DEV_JWT_SECRET: &str = "steel-pos-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub database_max_connections: u32,

    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,

    /// tracing filter directive
    pub log_level: String,

    /// Header line on printed receipts
    pub store_name: String,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ServerConfig {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),

            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "./steel-pos.db".to_string())
                .into(),

            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()))?,

            // In production this MUST be set via environment variable
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),

            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),

            store_name: lookup("STORE_NAME").unwrap_or_else(|| "Steel POS".to_string()),
        };

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if config.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.database_max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("./steel-pos.db"));
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.store_name, "Steel POS");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DATABASE_PATH", "/var/lib/steel/pos.db"),
            ("JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9000");
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue(key)) if key == "PORT"
        ));
        assert!(matches!(
            load(&[("DATABASE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", "  ")]),
            Err(ConfigError::MissingRequired(_))
        ));
    }
}
