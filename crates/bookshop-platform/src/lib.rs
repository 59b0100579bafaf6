//! BookShop Platform
//!
//! Two-store shop backend:
//! - Product catalog ("stock") in MongoDB
//! - Users and orders in a relational store (SQLite or PostgreSQL via sqlx)
//! - JWT (HS256) authentication with admin/user roles
//! - API-key + version gateway in front of every route
//!
//! ## Module Organization (Aggregate-based)
//!
//! Each aggregate contains:
//! - `entity` - Domain entities
//! - `repository` - Data access
//! - `api` - REST endpoints

// Core aggregates
pub mod catalog;
pub mod account;
pub mod order;

// Authentication & authorization
pub mod auth;

// Shared infrastructure
pub mod shared;

// Development seeding
pub mod seed;

// Re-export common types from shared
pub use shared::error::{Result, ShopError};
pub use shared::paging::{PageParams, PageWindow, SortKey};

// Re-export main entity types for convenience
pub use account::entity::User;
pub use catalog::entity::Product;
pub use order::entity::{Order, PriceView};

// Re-export repositories
pub use account::repository::{PostgresUserRepository, SqliteUserRepository, UserRepository};
pub use catalog::repository::{StockFilter, StockRepository};
pub use order::repository::{OrderRepository, PostgresOrderRepository, SqliteOrderRepository};

// Re-export services
pub use auth::auth_service::{AccessTokenClaims, AuthConfig, AuthService};
pub use auth::password_service::{Argon2Config, PasswordPolicy, PasswordService};

/// API surface re-exports
pub mod api {
    // Middleware
    pub use crate::shared::middleware::{
        checks, ApiVersion, AppState, AuthContext, Authenticated, GatewayLayer, OptionalAuth,
        Versioned,
    };
    pub use crate::shared::api_common::{ApiError, CountResponse, SuccessResponse};

    // API state and router exports from each aggregate
    pub use crate::auth::api::{auth_router, AuthApiState};
    pub use crate::catalog::api::{catalog_router, CatalogState};
    pub use crate::order::api::{orders_router, OrdersState};
}
