//! Development Data Seeder
//!
//! Seeds a sample catalog and default accounts on startup in dev mode.
//!
//! Default credentials:
//!   Store Admin:  admin / DevPassword123!
//!   Shopper:      reader / DevPassword123!

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::account::entity::User;
use crate::account::repository::UserRepository;
use crate::auth::password_service::{Argon2Config, PasswordPolicy, PasswordService};
use crate::catalog::entity::Product;
use crate::catalog::repository::StockRepository;
use crate::shared::error::Result;
use bookshop_common::{ROLE_ADMIN, ROLE_USER};

const DEV_PASSWORD: &str = "DevPassword123!";

/// Development data seeder
pub struct DevDataSeeder {
    stock: Arc<StockRepository>,
    users: Arc<dyn UserRepository>,
    password_service: PasswordService,
}

impl DevDataSeeder {
    pub fn new(stock: Arc<StockRepository>, users: Arc<dyn UserRepository>) -> Self {
        // Testing config for faster seeding, but still Argon2id
        let password_service = PasswordService::new(
            Argon2Config::testing(),
            PasswordPolicy::lenient(),
        );
        Self {
            stock,
            users,
            password_service,
        }
    }

    /// Seed all development data
    pub async fn seed(&self) -> Result<()> {
        info!("=== DEV DATA SEEDER ===");

        self.seed_catalog().await?;
        self.seed_accounts().await?;

        info!("Development data seeded");
        info!("Default logins:");
        info!("  Store Admin:  admin / {}", DEV_PASSWORD);
        info!("  Shopper:      reader / {}", DEV_PASSWORD);
        info!("=======================");

        Ok(())
    }

    async fn seed_catalog(&self) -> Result<()> {
        if self.stock.count(false).await? > 0 {
            return Ok(());
        }

        for product in sample_books() {
            self.stock.insert(&product).await?;
        }
        info!("Sample catalog seeded");
        Ok(())
    }

    async fn seed_accounts(&self) -> Result<()> {
        if self.users.find_by_username("admin").await?.is_none() {
            let hash = self.password_service.hash_password(DEV_PASSWORD)?;
            let admin = User::new("admin", "admin@bookshop.local", hash)
                .with_roles(vec![ROLE_ADMIN.to_string()]);
            self.users.insert(&admin).await?;
        }

        if self.users.find_by_username("reader").await?.is_none() {
            let hash = self.password_service.hash_password(DEV_PASSWORD)?;
            let reader = User::new("reader", "reader@bookshop.local", hash)
                .with_roles(vec![ROLE_USER.to_string()]);
            self.users.insert(&reader).await?;
        }

        Ok(())
    }
}

fn book(
    title: &str,
    author: &str,
    language: &str,
    genres: &[&str],
    price_cents: i64,
    available: bool,
) -> Product {
    Product {
        id: None,
        title: title.to_string(),
        author: author.to_string(),
        annotation: String::new(),
        language: language.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        available,
        link: String::new(),
        price: Decimal::new(price_cents, 2),
    }
    .normalize()
}

fn sample_books() -> Vec<Product> {
    vec![
        book(
            "The Master and Margarita",
            "Mikhail Bulgakov",
            "English",
            &["classics", "fantasy"],
            1499,
            true,
        ),
        book(
            "Dead Souls",
            "Nikolai Gogol",
            "English",
            &["classics", "satire"],
            1199,
            true,
        ),
        book(
            "The Idiot",
            "Fyodor Dostoevsky",
            "English",
            &["classics"],
            1350,
            true,
        ),
        book(
            "A Short History of Nearly Everything",
            "Bill Bryson",
            "English",
            &["science", "history"],
            1825,
            true,
        ),
        book(
            "Kobzar",
            "Taras Shevchenko",
            "Ukrainian",
            &["poetry", "classics"],
            999,
            false,
        ),
        book(
            "The Hobbit",
            "J. R. R. Tolkien",
            "English",
            &["fantasy"],
            1075,
            true,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_books_are_normalized() {
        for product in sample_books() {
            assert!(!product.genres.is_empty());
            assert!(product.price >= Decimal::ZERO);
            assert_eq!(product.link, crate::catalog::entity::BLANK_LINK);
        }
    }
}
