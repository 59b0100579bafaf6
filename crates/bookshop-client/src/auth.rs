//! Authentication support for the BookShop client
//!
//! Password login against `/authorization/login` with token caching and
//! refresh shortly before expiry.

use crate::error::{Error, Result};
use crate::types::Token;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Refresh this long before the token actually expires.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Login request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

/// Cached token with expiration tracking
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        self.expires_at > Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECS)
    }
}

/// Token manager performing password login and caching the bearer token
#[derive(Debug)]
pub struct TokenManager {
    login: String,
    password: String,
    login_url: String,
    api_key: String,
    api_version: &'static str,
    http_client: reqwest::Client,
    cached_token: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenManager {
    pub fn new(
        login: String,
        password: String,
        login_url: String,
        api_key: String,
        api_version: &'static str,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            login,
            password,
            login_url,
            api_key,
            api_version,
            http_client,
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get a valid access token, signing in again if necessary
    pub async fn get_token(&self) -> Result<String> {
        // Check for a valid cached token first
        {
            let cached = self.cached_token.read().await;
            if let Some(ref token) = *cached {
                if token.is_valid() {
                    return Ok(token.token.clone());
                }
            }
        }

        // Sign in and cache the result
        let mut cached = self.cached_token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(ref token) = *cached {
            if token.is_valid() {
                return Ok(token.token.clone());
            }
        }

        let token = self.sign_in().await?;
        let result = token.token.clone();
        *cached = Some(token);
        Ok(result)
    }

    /// Drop the cached token, forcing a fresh login on the next request
    pub async fn invalidate_token(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    async fn sign_in(&self) -> Result<CachedToken> {
        let response = self
            .http_client
            .post(&self.login_url)
            .header(bookshop_common::API_KEY_HEADER, &self.api_key)
            .header(bookshop_common::API_VERSION_HEADER, self.api_version)
            .json(&LoginRequest {
                login: &self.login,
                password: &self.password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, body));
        }

        let token: Token = response.json().await?;
        let expires_at = DateTime::parse_from_rfc3339(&token.expiration)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Error::Other(format!("Unparseable token expiration: {}", e)))?;

        Ok(CachedToken {
            token: token.token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_validity_buffer() {
        let fresh = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::seconds(3600),
        };
        assert!(fresh.is_valid());

        // Inside the refresh buffer counts as expired
        let stale = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() + Duration::seconds(EXPIRY_BUFFER_SECS / 2),
        };
        assert!(!stale.is_valid());

        let expired = CachedToken {
            token: "t".into(),
            expires_at: Utc::now() - Duration::seconds(10),
        };
        assert!(!expired.is_valid());
    }
}
