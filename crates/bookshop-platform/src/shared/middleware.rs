//! API Middleware
//!
//! Gateway layer and authentication extractors for Axum.
//!
//! Every request must present the static API key (`x-API-key`) and a
//! supported API version (`ApiVersion-BooksStore`). The parsed version and
//! the shared auth state are stashed in request extensions so handlers and
//! extractors can pick them up without touching global state.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use crate::auth::auth_service::{extract_bearer_token, AuthService};
use crate::shared::api_common::ApiError;
use crate::shared::error::ShopError;
use bookshop_common::{API_KEY_HEADER, API_VERSION_HEADER, ROLE_ADMIN};

/// API surface selected by the version header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// Version 1: the administrative surface (full catalog, mutations)
    Admin,
    /// Version 2: the shopper surface (available products only)
    User,
    /// Version 3: unauthenticated read-only catalog access
    Guest,
}

impl ApiVersion {
    /// Parse the `ApiVersion-BooksStore` header value.
    pub fn from_header(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::Admin),
            "2" => Some(Self::User),
            "3" => Some(Self::Guest),
            _ => None,
        }
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
}

/// Identity resolved from a validated access token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

/// Role and version checks shared by the API handlers.
pub mod checks {
    use super::{ApiVersion, AuthContext};
    use crate::shared::error::{Result, ShopError};

    /// The caller must hold the admin role.
    pub fn require_admin(ctx: &AuthContext) -> Result<()> {
        if ctx.is_admin() {
            Ok(())
        } else {
            Err(ShopError::forbidden(format!(
                "user '{}' does not have authority for this operation",
                ctx.username
            )))
        }
    }

    /// Catalog mutations exist only on the admin surface.
    pub fn require_admin_surface(version: ApiVersion) -> Result<()> {
        if version == ApiVersion::Admin {
            Ok(())
        } else {
            Err(ShopError::forbidden(
                "this operation is only available on API version 1",
            ))
        }
    }
}

/// Authenticated user extractor
/// Validates the bearer JWT and extracts an AuthContext from the request
pub struct Authenticated(pub AuthContext);

impl std::ops::Deref for Authenticated {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Error response for authentication failures
pub struct AuthError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ApiError {
            error: "UNAUTHORIZED".to_string(),
            message: self.message,
            details: None,
        };
        (self.status, Json(body)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get AppState from extensions (set by the gateway layer)
        let app_state = parts.extensions.get::<AppState>()
            .ok_or_else(|| AuthError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Auth service not configured".to_string(),
            })?;

        let token = parts.headers
            .get(AUTHORIZATION)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| AuthError {
                status: StatusCode::UNAUTHORIZED,
                message: "Missing authentication token".to_string(),
            })?;

        let claims = app_state.auth_service.validate_token(token)
            .map_err(|e: ShopError| AuthError {
                status: StatusCode::UNAUTHORIZED,
                message: e.to_string(),
            })?;

        Ok(Authenticated(AuthContext {
            user_id: claims.sub,
            username: claims.name,
            roles: claims.roles,
        }))
    }
}

/// Optional authentication extractor
/// Tries to validate the JWT but allows unauthenticated requests
pub struct OptionalAuth(pub Option<AuthContext>);

impl std::ops::Deref for OptionalAuth {
    type Target = Option<AuthContext>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(app_state) = parts.extensions.get::<AppState>() else {
            return Ok(OptionalAuth(None));
        };

        let token = parts.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token);

        let Some(token) = token else {
            return Ok(OptionalAuth(None));
        };

        let Ok(claims) = app_state.auth_service.validate_token(token) else {
            return Ok(OptionalAuth(None));
        };

        Ok(OptionalAuth(Some(AuthContext {
            user_id: claims.sub,
            username: claims.name,
            roles: claims.roles,
        })))
    }
}

/// Extractor for the API version stashed by the gateway layer.
pub struct Versioned(pub ApiVersion);

#[async_trait]
impl<S> FromRequestParts<S> for Versioned
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<ApiVersion>()
            .copied()
            .map(Versioned)
            .ok_or_else(|| AuthError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "API gateway layer not configured".to_string(),
            })
    }
}

/// Gateway layer validating the API key and version headers and injecting
/// the shared state into request extensions.
use tower::Layer;
use tower::Service;
use std::task::{Context, Poll};
use std::future::Future;
use std::pin::Pin;

#[derive(Clone)]
pub struct GatewayLayer {
    state: AppState,
    api_key: Arc<String>,
}

impl GatewayLayer {
    pub fn new(state: AppState, api_key: impl Into<String>) -> Self {
        Self {
            state,
            api_key: Arc::new(api_key.into()),
        }
    }
}

impl<S> Layer<S> for GatewayLayer {
    type Service = GatewayMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GatewayMiddleware {
            inner,
            state: self.state.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GatewayMiddleware<S> {
    inner: S,
    state: AppState,
    api_key: Arc<String>,
}

impl<S> GatewayMiddleware<S> {
    /// Validate the gateway headers and return the requested version.
    fn check_headers<B>(&self, req: &axum::http::Request<B>) -> Result<ApiVersion, ShopError> {
        let key = req.headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if key.is_empty() {
            return Err(ShopError::validation("Missing API key header"));
        }

        let version_value = req.headers()
            .get(API_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let version = ApiVersion::from_header(version_value)
            .ok_or_else(|| ShopError::UnsupportedVersion {
                value: version_value.to_string(),
            })?;

        if key != self.api_key.as_str() {
            return Err(ShopError::unauthorized("Invalid API key"));
        }

        Ok(version)
    }
}

impl<S, B> Service<axum::http::Request<B>> for GatewayMiddleware<S>
where
    S: Service<axum::http::Request<B>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let version = match self.check_headers(&req) {
            Ok(version) => version,
            Err(err) => {
                tracing::warn!(error = %err, path = %req.uri().path(), "Gateway rejected request");
                let response = err.into_response();
                return Box::pin(async move { Ok(response) });
            }
        };

        req.extensions_mut().insert(self.state.clone());
        req.extensions_mut().insert(version);

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parsing() {
        assert_eq!(ApiVersion::from_header("1"), Some(ApiVersion::Admin));
        assert_eq!(ApiVersion::from_header("2"), Some(ApiVersion::User));
        assert_eq!(ApiVersion::from_header("3"), Some(ApiVersion::Guest));
        assert_eq!(ApiVersion::from_header(" 2 "), Some(ApiVersion::User));
        assert_eq!(ApiVersion::from_header("4"), None);
        assert_eq!(ApiVersion::from_header("1.0"), None);
        assert_eq!(ApiVersion::from_header(""), None);
    }

    #[test]
    fn test_auth_context_roles() {
        let ctx = AuthContext {
            user_id: "u1".into(),
            username: "alice".into(),
            roles: vec!["admin".into()],
        };
        assert!(ctx.is_admin());
        assert!(checks::require_admin(&ctx).is_ok());

        let ctx = AuthContext {
            user_id: "u2".into(),
            username: "bob".into(),
            roles: vec!["user".into()],
        };
        assert!(!ctx.is_admin());
        assert!(checks::require_admin(&ctx).is_err());
    }

    #[test]
    fn test_mutations_are_admin_surface_only() {
        assert!(checks::require_admin_surface(ApiVersion::Admin).is_ok());
        assert!(checks::require_admin_surface(ApiVersion::User).is_err());
        assert!(checks::require_admin_surface(ApiVersion::Guest).is_err());
    }
}
