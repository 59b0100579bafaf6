//! Order Repository
//!
//! Relational persistence for orders with SQLite and PostgreSQL backends
//! behind one trait. Product ids are stored as a JSON text column; money as
//! canonical decimal strings; timestamps as epoch millis.

use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;

use crate::order::entity::Order;
use crate::shared::error::{Result, ShopError};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Replace the stored order (lines, total, timestamp, submitted flag).
    async fn update(&self, order: &Order) -> Result<()>;

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>>;

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>>;

    async fn find_unsubmitted_by_user(&self, user_id: &str) -> Result<Option<Order>>;

    /// Remove every order belonging to the user (account deletion).
    async fn delete_by_user(&self, user_id: &str) -> Result<u64>;
}

const ORDER_COLUMNS: &str =
    "order_id, user_id, product_ids, total_price, ordered_at, submitted";

fn lines_to_json(order: &Order) -> Result<String> {
    Ok(serde_json::to_string(&order.product_ids)?)
}

fn order_from_parts(
    order_id: String,
    user_id: String,
    lines_json: &str,
    total_price: &str,
    ordered_at_millis: i64,
    submitted: bool,
) -> Result<Order> {
    let product_ids: Vec<String> = serde_json::from_str(lines_json)?;
    let total_price = Decimal::from_str(total_price)
        .map_err(|e| ShopError::internal(format!("Invalid stored price: {}", e)))?;
    let ordered_at = DateTime::from_timestamp_millis(ordered_at_millis)
        .ok_or_else(|| ShopError::internal("Invalid ordered_at timestamp"))?;

    Ok(Order {
        order_id,
        user_id,
        product_ids,
        total_price,
        ordered_at,
        submitted,
    })
}

// ============================================================================
// SQLite
// ============================================================================

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the orders table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                order_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                product_ids TEXT NOT NULL,
                total_price TEXT NOT NULL,
                ordered_at INTEGER NOT NULL,
                submitted INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id)")
            .execute(&self.pool)
            .await?;

        debug!("orders schema ensured (sqlite)");
        Ok(())
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> Result<Order> {
        order_from_parts(
            row.get("order_id"),
            row.get("user_id"),
            row.get::<String, _>("product_ids").as_str(),
            row.get::<String, _>("total_price").as_str(),
            row.get("ordered_at"),
            row.get("submitted"),
        )
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (order_id, user_id, product_ids, total_price, ordered_at, submitted) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.order_id)
        .bind(&order.user_id)
        .bind(lines_to_json(order)?)
        .bind(order.total_price.to_string())
        .bind(order.ordered_at.timestamp_millis())
        .bind(order.submitted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET product_ids = ?, total_price = ?, ordered_at = ?, submitted = ? \
             WHERE order_id = ?",
        )
        .bind(lines_to_json(order)?)
        .bind(order.total_price.to_string())
        .bind(order.ordered_at.timestamp_millis())
        .bind(order.submitted)
        .bind(&order.order_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>> {
        let query = format!("SELECT {} FROM orders WHERE order_id = ?", ORDER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let query = format!(
            "SELECT {} FROM orders WHERE user_id = ? ORDER BY ordered_at DESC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(Self::parse_row(row)?);
        }
        Ok(orders)
    }

    async fn find_unsubmitted_by_user(&self, user_id: &str) -> Result<Option<Order>> {
        let query = format!(
            "SELECT {} FROM orders WHERE user_id = ? AND submitted = 0 LIMIT 1",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the orders table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                order_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                product_ids TEXT NOT NULL,
                total_price TEXT NOT NULL,
                ordered_at BIGINT NOT NULL,
                submitted BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders (user_id)")
            .execute(&self.pool)
            .await?;

        debug!("orders schema ensured (postgres)");
        Ok(())
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> Result<Order> {
        order_from_parts(
            row.get("order_id"),
            row.get("user_id"),
            row.get::<String, _>("product_ids").as_str(),
            row.get::<String, _>("total_price").as_str(),
            row.get("ordered_at"),
            row.get("submitted"),
        )
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (order_id, user_id, product_ids, total_price, ordered_at, submitted) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&order.order_id)
        .bind(&order.user_id)
        .bind(lines_to_json(order)?)
        .bind(order.total_price.to_string())
        .bind(order.ordered_at.timestamp_millis())
        .bind(order.submitted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET product_ids = $1, total_price = $2, ordered_at = $3, submitted = $4 \
             WHERE order_id = $5",
        )
        .bind(lines_to_json(order)?)
        .bind(order.total_price.to_string())
        .bind(order.ordered_at.timestamp_millis())
        .bind(order.submitted)
        .bind(&order.order_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>> {
        let query = format!("SELECT {} FROM orders WHERE order_id = $1", ORDER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let query = format!(
            "SELECT {} FROM orders WHERE user_id = $1 ORDER BY ordered_at DESC",
            ORDER_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(Self::parse_row(row)?);
        }
        Ok(orders)
    }

    async fn find_unsubmitted_by_user(&self, user_id: &str) -> Result<Option<Order>> {
        let query = format!(
            "SELECT {} FROM orders WHERE user_id = $1 AND submitted = FALSE LIMIT 1",
            ORDER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::parse_row).transpose()
    }

    async fn delete_by_user(&self, user_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn test_order_round_trips_through_row_parts() {
        let mut order = Order::new("user-1");
        order.add_product("a", Decimal::from_f64(12.34).unwrap());
        order.add_product("b", Decimal::from_f64(0.66).unwrap());

        let restored = order_from_parts(
            order.order_id.clone(),
            order.user_id.clone(),
            &lines_to_json(&order).unwrap(),
            &order.total_price.to_string(),
            order.ordered_at.timestamp_millis(),
            order.submitted,
        )
        .unwrap();

        assert_eq!(restored.product_ids, order.product_ids);
        assert_eq!(restored.total_price, order.total_price);
        assert!(!restored.submitted);
    }

    #[test]
    fn test_garbage_price_is_an_error() {
        let result = order_from_parts(
            "o".into(),
            "u".into(),
            "[]",
            "twelve dollars",
            0,
            false,
        );
        assert!(result.is_err());
    }
}
