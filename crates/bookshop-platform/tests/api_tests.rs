//! Platform API Integration Tests
//!
//! Tests for domain models, the order lifecycle, authorization, and error
//! handling; no live databases involved.

use rust_decimal::Decimal;
use std::collections::HashMap;

use bookshop_common::{ROLE_ADMIN, ROLE_USER};
use bookshop_platform::api::{checks, ApiVersion, AuthContext};
use bookshop_platform::{
    AccessTokenClaims, AuthConfig, AuthService, Order, PageWindow, PriceView, Product, User,
};

fn dec(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// Unit tests for domain models
mod domain_tests {
    use super::*;

    #[test]
    fn test_user_roles() {
        let user = User::new("alice", "alice@example.com", "$argon2id$fake")
            .with_roles(vec![ROLE_ADMIN.to_string()]);
        assert!(user.is_admin());
        assert!(user.has_role(ROLE_ADMIN));
        assert!(!user.has_role(ROLE_USER));
    }

    #[test]
    fn test_product_normalization() {
        let product = Product {
            id: None,
            title: "Test".into(),
            author: "Author".into(),
            annotation: String::new(),
            language: "English".into(),
            genres: vec!["  ".into()],
            available: true,
            link: "ftp://not-http".into(),
            price: dec(-100),
        }
        .normalize();

        assert_eq!(product.genres, vec!["unspecified".to_string()]);
        assert_eq!(product.link, "about:blank");
        assert_eq!(product.price, Decimal::ZERO);
    }
}

// Order lifecycle tests: create -> add/remove -> submit
mod order_lifecycle_tests {
    use super::*;

    fn catalog(entries: &[(&str, i64)]) -> PriceView {
        entries
            .iter()
            .map(|(id, cents)| (id.to_string(), dec(*cents)))
            .collect()
    }

    #[test]
    fn test_full_lifecycle_happy_path() {
        let view = catalog(&[("a", 1000), ("b", 550)]);

        let mut order = Order::new("user-1");
        order.add_product("a", dec(1000));
        order.add_product("b", dec(550));
        assert_eq!(order.total_price, dec(1550));

        let removed = order.remove_products(&["b".to_string()], &view);
        assert_eq!(removed, vec!["b"]);
        assert_eq!(order.total_price, dec(1000));

        let dropped = order.try_submit(&view);
        assert!(dropped.is_empty());
        assert!(order.submitted);
    }

    #[test]
    fn test_submit_reconciles_unavailable_lines() {
        // "b" disappears from the catalog between add and submit
        let mut order = Order::new("user-1");
        order.add_product("a", dec(1000));
        order.add_product("b", dec(550));

        let view = catalog(&[("a", 1000)]);
        let dropped = order.try_submit(&view);

        assert_eq!(dropped, vec!["b"]);
        assert!(!order.submitted, "order must stay open after a cleanup");
        assert_eq!(order.total_price, dec(1000));

        // Second submit goes through
        assert!(order.try_submit(&view).is_empty());
        assert!(order.submitted);
    }

    #[test]
    fn test_price_changes_are_picked_up_on_reprice() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(1000));

        // Price raised after the line was added
        order.reprice(&catalog(&[("a", 1250)]));
        assert_eq!(order.total_price, dec(1250));
    }

    #[test]
    fn test_reconcile_reports_each_dropped_id_once() {
        let mut order = Order::new("user-1");
        order.add_product("gone", dec(100));
        order.add_product("gone", dec(100));
        order.add_product("a", dec(1000));

        let dropped = order.reconcile(&catalog(&[("a", 1000)]));
        assert_eq!(dropped, vec!["gone"]);
        assert_eq!(order.product_ids, vec!["a"]);
    }

    #[test]
    fn test_removal_of_unknown_product_subtracts_nothing() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(1000));

        // Catalog no longer knows "a": removal still works, price falls back to zero
        let removed = order.remove_products(&["a".to_string()], &HashMap::new());
        assert_eq!(removed, vec!["a"]);
        assert!(order.is_empty());
        assert_eq!(order.total_price, dec(1000));
    }
}

// Page-window tests: the shape every catalog listing goes through
mod paging_tests {
    use super::*;

    #[test]
    fn test_window_defaults() {
        let window = PageWindow::new(1, 5, 42);
        assert_eq!(window.page, 1);
        assert_eq!(window.per_page, 5);
        assert_eq!(window.total_pages, 9);
        assert_eq!(window.to_skip, 0);
    }

    #[test]
    fn test_window_clamps_everything() {
        // Oversized page size, page far beyond the end
        let window = PageWindow::new(1_000, 10_000, 42);
        assert_eq!(window.per_page, 30);
        assert_eq!(window.total_pages, 2);
        assert_eq!(window.page, 2);
        assert_eq!(window.to_skip, 30);
    }

    #[test]
    fn test_window_on_empty_catalog() {
        let window = PageWindow::new(1, 5, 0);
        assert_eq!(window.total_pages, 0);
        assert_eq!(window.to_skip, 0);
    }
}

// Authorization context tests
mod authorization_tests {
    use super::*;

    fn context(roles: &[&str]) -> AuthContext {
        AuthContext {
            user_id: "user-1".to_string(),
            username: "alice".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_check() {
        assert!(checks::require_admin(&context(&[ROLE_ADMIN])).is_ok());
        assert!(checks::require_admin(&context(&[ROLE_USER])).is_err());
        assert!(checks::require_admin(&context(&[])).is_err());
    }

    #[test]
    fn test_surface_check() {
        assert!(checks::require_admin_surface(ApiVersion::Admin).is_ok());
        assert!(checks::require_admin_surface(ApiVersion::User).is_err());
        assert!(checks::require_admin_surface(ApiVersion::Guest).is_err());
    }

    #[test]
    fn test_version_header_values() {
        assert_eq!(ApiVersion::from_header("1"), Some(ApiVersion::Admin));
        assert_eq!(ApiVersion::from_header("2"), Some(ApiVersion::User));
        assert_eq!(ApiVersion::from_header("3"), Some(ApiVersion::Guest));
        assert_eq!(ApiVersion::from_header("0"), None);
        assert_eq!(ApiVersion::from_header("latest"), None);
    }
}

// Token round-trip tests
mod token_tests {
    use super::*;

    fn service(secret: &str) -> AuthService {
        AuthService::new(AuthConfig {
            secret_key: secret.to_string(),
            ..AuthConfig::default()
        })
    }

    fn claims_for(roles: &[&str]) -> AccessTokenClaims {
        let user = User::new("alice", "alice@example.com", "$argon2id$fake")
            .with_roles(roles.iter().map(|r| r.to_string()).collect());
        let svc = service("integration-secret");
        let (token, _) = svc.generate_access_token(&user).unwrap();
        svc.validate_token(&token).unwrap()
    }

    #[test]
    fn test_claims_drive_auth_context() {
        let claims = claims_for(&[ROLE_ADMIN, ROLE_USER]);
        let ctx = AuthContext {
            user_id: claims.sub,
            username: claims.name,
            roles: claims.roles,
        };
        assert!(ctx.is_admin());
        assert_eq!(ctx.username, "alice");
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let user = User::new("alice", "alice@example.com", "$argon2id$fake");
        let (token, _) = service("secret-a").generate_access_token(&user).unwrap();

        // Signed with a different key
        assert!(service("secret-b").validate_token(&token).is_err());

        // Structurally damaged
        let mut broken = token.clone();
        broken.push('x');
        assert!(service("secret-a").validate_token(&broken).is_err());
    }
}
