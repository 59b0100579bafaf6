//! Authentication Aggregate
//!
//! Password hashing, JWT minting and validation, and the authorization API.

pub mod auth_service;
pub mod password_service;
pub mod api;

// Re-export main types
pub use auth_service::{AccessTokenClaims, AuthConfig, AuthService};
pub use password_service::{Argon2Config, PasswordPolicy, PasswordService};
pub use api::{auth_router, AuthApiState};
