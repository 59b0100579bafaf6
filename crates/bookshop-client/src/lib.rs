//! # BookShop client
//!
//! Typed Rust client for the BookShop API — the consuming tier of the shop.
//!
//! ## Features
//!
//! - **API client**: typed methods for the catalog, authorization, and order
//!   endpoints
//! - **Authentication**: password login with automatic token caching and
//!   refresh before expiry
//! - **Gateway headers**: every request carries the API key and the API
//!   version header the server's gateway requires
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bookshop_client::{Client, Config, Surface};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("http://localhost:8080", "my-api-key", Surface::User)
//!         .with_credentials("reader", "DevPassword123!");
//!
//!     let client = Client::new(config)?;
//!
//!     let books = client.books_all().await?;
//!     println!("Found {} books", books.len());
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export main types
pub use client::Client;
pub use config::{Config, Surface};
pub use error::{Error, Result};
