//! Order Aggregate
//!
//! Cart-like orders with a create -> modify -> submit lifecycle.

pub mod entity;
pub mod repository;
pub mod api;

// Re-export main types
pub use entity::{Order, PriceView};
pub use repository::{OrderRepository, PostgresOrderRepository, SqliteOrderRepository};
pub use api::{orders_router, OrdersState};
