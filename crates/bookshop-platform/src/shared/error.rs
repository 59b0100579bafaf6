//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Duplicate entity: {entity_type} with {field}={value}")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{message}")]
    NoResults { message: String },

    #[error("Authorization error: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Unsupported API version: {value}")]
    UnsupportedVersion { value: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Sql error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ShopError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(entity_type: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn no_results(message: impl Into<String>) -> Self {
        Self::NoResults { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ShopError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ShopError::NoResults { .. } => (StatusCode::NOT_FOUND, "NO_RESULTS"),
            ShopError::Duplicate { .. } => (StatusCode::CONFLICT, "DUPLICATE"),
            ShopError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ShopError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ShopError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ShopError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ShopError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            ShopError::InvalidToken { .. } => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            ShopError::UnsupportedVersion { .. } => (StatusCode::EXPECTATION_FAILED, "UNSUPPORTED_VERSION"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ShopError::not_found("Product", "abc"), StatusCode::NOT_FOUND),
            (ShopError::duplicate("Order", "user", "u1"), StatusCode::CONFLICT),
            (ShopError::validation("bad input"), StatusCode::BAD_REQUEST),
            (ShopError::unauthorized("no token"), StatusCode::UNAUTHORIZED),
            (ShopError::forbidden("admins only"), StatusCode::FORBIDDEN),
            (ShopError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ShopError::TokenExpired, StatusCode::UNAUTHORIZED),
            (
                ShopError::UnsupportedVersion { value: "9".into() },
                StatusCode::EXPECTATION_FAILED,
            ),
            (ShopError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
