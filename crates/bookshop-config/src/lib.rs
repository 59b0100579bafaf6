//! BookShop Configuration System
//!
//! This crate provides TOML-based configuration with environment variable
//! override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub mongodb: MongoConfig,
    pub sql: SqlConfig,
    pub jwt: JwtConfig,

    /// Static API key every request must present in `x-API-key`
    pub api_key: String,

    /// Enable development mode (data seeding, relaxed validation)
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            mongodb: MongoConfig::default(),
            sql: SqlConfig::default(),
            jwt: JwtConfig::default(),
            api_key: String::new(),
            dev_mode: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// MongoDB configuration for the product catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub url: String,
    pub database: String,
    pub collection: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: "bookshop".to_string(),
            collection: "books".to_string(),
        }
    }
}

/// Relational store configuration for users and orders
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Database type: `sqlite` or `postgres`
    pub db_type: String,
    pub sqlite_path: String,
    pub postgres_url: String,
    pub max_connections: u32,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            db_type: "sqlite".to_string(),
            sqlite_path: "./data/bookshop.db".to_string(),
            postgres_url: "postgres://localhost:5432/bookshop".to_string(),
            max_connections: 5,
        }
    }
}

/// JWT signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_expiry_secs: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "bookshop".to_string(),
            audience: "bookshop-api".to_string(),
            token_expiry_secs: 3600, // 1 hour
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Outside dev mode the JWT secret and the API key must be set; a server
    /// that starts without them would mint unverifiable tokens and accept
    /// any caller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dev_mode {
            if self.jwt.secret.is_empty() {
                return Err(ConfigError::ValidationError(
                    "jwt.secret must be set outside dev mode".to_string(),
                ));
            }
            if self.api_key.is_empty() {
                return Err(ConfigError::ValidationError(
                    "api_key must be set outside dev mode".to_string(),
                ));
            }
        }

        match self.sql.db_type.as_str() {
            "sqlite" | "postgres" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown sql.db_type: {other}. Use sqlite or postgres"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.mongodb.collection, "books");
        assert_eq!(config.sql.db_type, "sqlite");
        assert_eq!(config.jwt.token_expiry_secs, 3600);
    }

    #[test]
    fn test_parse_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_key = "secret-key"

[http]
port = 9090

[jwt]
secret = "sixty-four-characters-of-entropy"
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.http.port, 9090);
        assert_eq!(config.api_key, "secret-key");
        // Unspecified sections keep their defaults
        assert_eq!(config.mongodb.database, "bookshop");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_secret() {
        let config = AppConfig {
            api_key: "key".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_db_type() {
        let mut config = AppConfig {
            dev_mode: true,
            ..AppConfig::default()
        };
        config.sql.db_type = "mssql".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dev_mode_allows_empty_secrets() {
        let config = AppConfig {
            dev_mode: true,
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
