//! BookShop API Server
//!
//! Production server for the shop REST APIs:
//! - Catalog APIs: /books/*, /book/* (admin, shopper, and guest surfaces)
//! - Account APIs: /authorization/*, /account/order*
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BOOKSHOP_HTTP_PORT` | `8080` | HTTP API port |
//! | `BOOKSHOP_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `BOOKSHOP_MONGO_DB` | `bookshop` | MongoDB database name |
//! | `BOOKSHOP_MONGO_COLLECTION` | `books` | Catalog collection name |
//! | `BOOKSHOP_SQL_DB_TYPE` | `sqlite` | Relational backend: `sqlite` or `postgres` |
//! | `BOOKSHOP_SQLITE_PATH` | `./data/bookshop.db` | SQLite database file |
//! | `BOOKSHOP_POSTGRES_URL` | - | PostgreSQL connection URL |
//! | `BOOKSHOP_JWT_SECRET` | - | HMAC secret for access tokens |
//! | `BOOKSHOP_API_KEY` | - | Static API key callers must present |
//! | `BOOKSHOP_DEV_MODE` | `false` | Seed sample data and relax config checks |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use axum::{routing::get, response::Json, Router};
use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use bookshop_config::ConfigLoader;
use bookshop_platform::api::{
    auth_router, catalog_router, orders_router, AppState, AuthApiState, CatalogState,
    GatewayLayer, OrdersState,
};
use bookshop_platform::{
    AuthConfig, AuthService, OrderRepository, PasswordService, PostgresOrderRepository,
    PostgresUserRepository, SqliteOrderRepository, SqliteUserRepository, StockRepository,
    UserRepository,
};
use bookshop_platform::seed::DevDataSeeder;

#[tokio::main]
async fn main() -> Result<()> {
    bookshop_common::logging::init_logging("bookshop-server");

    info!("Starting BookShop API Server");

    // Configuration: TOML file with environment overrides
    let mut config = ConfigLoader::new().load()?;
    if config.dev_mode {
        if config.jwt.secret.is_empty() {
            warn!("Dev mode: using a built-in JWT secret, do not run this in production");
            config.jwt.secret = "dev-secret-not-for-production".to_string();
        }
        if config.api_key.is_empty() {
            warn!("Dev mode: using the built-in API key 'dev-api-key'");
            config.api_key = "dev-api-key".to_string();
        }
    }
    config.validate()?;

    // Connect to MongoDB (product catalog)
    info!(
        "Connecting to MongoDB: {}/{}",
        config.mongodb.url, config.mongodb.database
    );
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb.url).await?;
    let db = mongo_client.database(&config.mongodb.database);
    let stock = Arc::new(StockRepository::new(&db, &config.mongodb.collection));

    // Connect to the relational store (users and orders)
    let (users, orders): (Arc<dyn UserRepository>, Arc<dyn OrderRepository>) =
        match config.sql.db_type.as_str() {
            "sqlite" => {
                if let Some(parent) = std::path::Path::new(&config.sql.sqlite_path).parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let url = format!("sqlite://{}?mode=rwc", config.sql.sqlite_path);
                info!("Connecting to SQLite: {}", config.sql.sqlite_path);
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(config.sql.max_connections)
                    .connect(&url)
                    .await?;

                let users = SqliteUserRepository::new(pool.clone());
                users.ensure_schema().await?;
                let orders = SqliteOrderRepository::new(pool);
                orders.ensure_schema().await?;
                (Arc::new(users), Arc::new(orders))
            }
            "postgres" => {
                info!("Connecting to PostgreSQL");
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.sql.max_connections)
                    .connect(&config.sql.postgres_url)
                    .await?;

                let users = PostgresUserRepository::new(pool.clone());
                users.ensure_schema().await?;
                let orders = PostgresOrderRepository::new(pool);
                orders.ensure_schema().await?;
                (Arc::new(users), Arc::new(orders))
            }
            other => {
                anyhow::bail!("Unknown sql.db_type: {}. Use sqlite or postgres", other);
            }
        };
    info!("Repositories initialized");

    // Auth services
    let auth_service = Arc::new(AuthService::new(AuthConfig {
        secret_key: config.jwt.secret.clone(),
        issuer: config.jwt.issuer.clone(),
        audience: config.jwt.audience.clone(),
        access_token_expiry_secs: config.jwt.token_expiry_secs,
    }));
    let password_service = Arc::new(PasswordService::default());
    info!("Auth services initialized");

    // Seed development data if in dev mode
    if config.dev_mode {
        let seeder = DevDataSeeder::new(stock.clone(), users.clone());
        if let Err(e) = seeder.seed().await {
            warn!("Dev data seeding skipped: {}", e);
        }
    }

    // Build API states
    let app_state = AppState {
        auth_service: auth_service.clone(),
    };
    let catalog_state = CatalogState {
        stock: stock.clone(),
    };
    let auth_api_state = AuthApiState {
        auth_service,
        password_service,
        users,
        orders: orders.clone(),
    };
    let orders_state = OrdersState { orders, stock };

    // Build the API router using OpenApiRouter for auto-collected OpenAPI paths
    let (api_router, mut openapi) = OpenApiRouter::new()
        .nest("/authorization", auth_router(auth_api_state))
        .nest("/account", orders_router(orders_state))
        .merge(catalog_router(catalog_state))
        .split_for_parts();

    // Register the security schemes referenced by the path annotations
    use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
    let components = openapi.components.get_or_insert(utoipa::openapi::Components::new());
    components.add_security_scheme(
        "api_key",
        SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(bookshop_common::API_KEY_HEADER))),
    );
    components.add_security_scheme(
        "bearer_auth",
        SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .build(),
        ),
    );

    openapi.info.title = "BookShop API".to_string();
    openapi.info.version = "1.0.0".to_string();
    openapi.info.description =
        Some("REST APIs for the book catalog, accounts, and orders".to_string());

    // The gateway guards the API routes; swagger and health stay open
    let app = Router::new()
        .merge(api_router.layer(GatewayLayer::new(app_state, config.api_key.clone())))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start the API server
    let api_addr = format!("{}:{}", config.http.host, config.http.port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;

    info!("BookShop API Server started");
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("BookShop API Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
