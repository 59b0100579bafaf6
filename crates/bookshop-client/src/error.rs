//! Error types for the BookShop client

use thiserror::Error;

/// Result type alias for BookShop client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the BookShop client
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication failed (401)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Authorization failed (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict, e.g. an open order already exists (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The server rejected the API version header (417)
    #[error("Unsupported API version: {0}")]
    UnsupportedVersion(String),

    /// Server error (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map a response status and body to an error
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        // The server sends { "error": ..., "message": ... }; surface the message
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or(body);

        match status {
            reqwest::StatusCode::BAD_REQUEST => Self::Validation(message),
            reqwest::StatusCode::UNAUTHORIZED => Self::Authentication(message),
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(message),
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            reqwest::StatusCode::CONFLICT => Self::Conflict(message),
            reqwest::StatusCode::EXPECTATION_FAILED => Self::UnsupportedVersion(message),
            s if s.is_server_error() => Self::Server(message),
            _ => Self::Other(message),
        }
    }

    /// Whether a retry could help
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server(_) | Self::Http(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error":"NOT_FOUND","message":"Entity not found"}"#.to_string();
        let err = Error::from_status(reqwest::StatusCode::NOT_FOUND, body);
        assert!(matches!(err, Error::NotFound(m) if m == "Entity not found"));

        let err = Error::from_status(reqwest::StatusCode::CONFLICT, "plain text".to_string());
        assert!(matches!(err, Error::Conflict(m) if m == "plain text"));
    }

    #[test]
    fn test_retryability() {
        assert!(Error::Server("boom".into()).is_retryable());
        assert!(!Error::Validation("bad".into()).is_retryable());
        assert!(!Error::Authentication("no".into()).is_retryable());
    }
}
