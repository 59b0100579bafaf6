//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "bookshop.toml",
    "./config/config.toml",
    "./config/bookshop.toml",
    "/etc/bookshop/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        // Start with defaults
        let mut config = AppConfig::default();

        // Try to load from file
        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        // Apply environment variable overrides
        self.apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        // Check explicit path first
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        // Check BOOKSHOP_CONFIG env var
        if let Ok(path) = env::var("BOOKSHOP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // Search standard paths
        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut AppConfig) {
        // HTTP
        if let Ok(val) = env::var("BOOKSHOP_HTTP_PORT") {
            if let Ok(port) = val.parse() {
                config.http.port = port;
            }
        }
        if let Ok(val) = env::var("BOOKSHOP_HTTP_HOST") {
            config.http.host = val;
        }

        // MongoDB (product catalog)
        if let Ok(val) = env::var("BOOKSHOP_MONGO_URL") {
            config.mongodb.url = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_MONGO_DB") {
            config.mongodb.database = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_MONGO_COLLECTION") {
            config.mongodb.collection = val;
        }

        // Relational store (users and orders)
        if let Ok(val) = env::var("BOOKSHOP_SQL_DB_TYPE") {
            config.sql.db_type = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_SQLITE_PATH") {
            config.sql.sqlite_path = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_POSTGRES_URL") {
            config.sql.postgres_url = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_SQL_MAX_CONNECTIONS") {
            if let Ok(n) = val.parse() {
                config.sql.max_connections = n;
            }
        }

        // JWT
        if let Ok(val) = env::var("BOOKSHOP_JWT_SECRET") {
            config.jwt.secret = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_JWT_ISSUER") {
            config.jwt.issuer = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_JWT_AUDIENCE") {
            config.jwt.audience = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_JWT_EXPIRY_SECS") {
            if let Ok(secs) = val.parse() {
                config.jwt.token_expiry_secs = secs;
            }
        }

        // Gateway
        if let Ok(val) = env::var("BOOKSHOP_API_KEY") {
            config.api_key = val;
        }
        if let Ok(val) = env::var("BOOKSHOP_DEV_MODE") {
            config.dev_mode = val == "true" || val == "1";
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
