//! Client configuration

use std::time::Duration;

/// API surface the client talks to, sent in the version header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Version 1: administrative surface
    Admin,
    /// Version 2: shopper surface
    User,
    /// Version 3: unauthenticated read-only catalog
    Guest,
}

impl Surface {
    /// Header value for `ApiVersion-BooksStore`.
    pub fn header_value(&self) -> &'static str {
        match self {
            Self::Admin => "1",
            Self::User => "2",
            Self::Guest => "3",
        }
    }
}

/// Configuration for the BookShop client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the BookShop API
    pub base_url: String,

    /// Static API key presented in `x-API-key`
    pub api_key: String,

    /// API surface (version header)
    pub surface: Surface,

    /// Login name for authenticated surfaces
    pub login: Option<String>,

    /// Password for authenticated surfaces
    pub password: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// Maximum retry attempts
    pub retry_attempts: u32,

    /// Initial retry delay
    pub retry_delay: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Config {
    /// Create a new configuration
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, surface: Surface) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: api_key.into(),
            surface,
            login: None,
            password: None,
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(100),
            user_agent: format!("BookShop-Rust-Client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set login credentials
    pub fn with_credentials(
        mut self,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry behaviour
    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = Config::new("http://localhost:8080///", "key", Surface::Guest);
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_surface_header_values() {
        assert_eq!(Surface::Admin.header_value(), "1");
        assert_eq!(Surface::User.header_value(), "2");
        assert_eq!(Surface::Guest.header_value(), "3");
    }
}
