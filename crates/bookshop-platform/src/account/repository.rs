//! User Repository
//!
//! Relational persistence for accounts with SQLite and PostgreSQL backends
//! behind one trait. Roles are stored as a JSON text column; timestamps as
//! epoch millis.

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{PgPool, Row, SqlitePool};
use tracing::debug;

use crate::account::entity::User;
use crate::shared::error::{Result, ShopError};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &User) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<bool>;
}

fn roles_to_json(user: &User) -> Result<String> {
    Ok(serde_json::to_string(&user.roles)?)
}

fn user_from_parts(
    id: String,
    username: String,
    email: String,
    password_hash: String,
    roles_json: &str,
    created_at_millis: i64,
) -> Result<User> {
    let roles: Vec<String> = serde_json::from_str(roles_json)?;
    let created_at = DateTime::from_timestamp_millis(created_at_millis)
        .ok_or_else(|| ShopError::internal("Invalid created_at timestamp"))?;

    Ok(User {
        id,
        username,
        email,
        password_hash,
        roles,
        created_at,
    })
}

// ============================================================================
// SQLite
// ============================================================================

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                roles TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("users schema ensured (sqlite)");
        Ok(())
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        user_from_parts(
            row.get("id"),
            row.get("username"),
            row.get("email"),
            row.get("password_hash"),
            row.get::<String, _>("roles").as_str(),
            row.get("created_at"),
        )
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT id, username, email, password_hash, roles, created_at \
             FROM users WHERE {} = ?",
            column
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_row).transpose()
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, roles, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(roles_to_json(user)?)
        .bind(user.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_one("id", id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                roles TEXT NOT NULL,
                created_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("users schema ensured (postgres)");
        Ok(())
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> Result<User> {
        user_from_parts(
            row.get("id"),
            row.get("username"),
            row.get("email"),
            row.get("password_hash"),
            row.get::<String, _>("roles").as_str(),
            row.get("created_at"),
        )
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT id, username, email, password_hash, roles, created_at \
             FROM users WHERE {} = $1",
            column
        );
        let row = sqlx::query(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_row).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, roles, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(roles_to_json(user)?)
        .bind(user.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        self.find_one("id", id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_round_trips_through_row_parts() {
        let user = User::new("alice", "alice@example.com", "$argon2id$fake")
            .with_roles(vec!["admin".to_string()]);

        let restored = user_from_parts(
            user.id.clone(),
            user.username.clone(),
            user.email.clone(),
            user.password_hash.clone(),
            &roles_to_json(&user).unwrap(),
            user.created_at.timestamp_millis(),
        )
        .unwrap();

        assert_eq!(restored.id, user.id);
        assert_eq!(restored.roles, user.roles);
        // Millis precision is all the store keeps
        assert_eq!(
            restored.created_at.timestamp_millis(),
            user.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_invalid_roles_json_is_an_error() {
        let result = user_from_parts(
            "id".into(),
            "u".into(),
            "e".into(),
            "h".into(),
            "not-json",
            0,
        );
        assert!(result.is_err());
    }
}
