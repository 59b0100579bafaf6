//! Order Entity
//!
//! A cart-like aggregate of product ids with a submitted/unsubmitted flag.
//! The lifecycle is create -> add/remove products -> submit; every transition
//! re-validates product availability against the catalog and recomputes the
//! total price. A user has at most one unsubmitted order at a time (enforced
//! by the API layer scanning the user's orders, not by a constraint).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Catalog view used by order transitions: product id -> current price,
/// containing only products that exist and are available.
pub type PriceView = HashMap<String, Decimal>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub user_id: String,
    pub product_ids: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    pub ordered_at: DateTime<Utc>,
    pub submitted: bool,
}

impl Order {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            order_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            product_ids: vec![],
            total_price: Decimal::ZERO,
            ordered_at: Utc::now(),
            submitted: false,
        }
    }

    /// Add one product line and its price to the running total.
    pub fn add_product(&mut self, product_id: impl Into<String>, price: Decimal) {
        self.product_ids.push(product_id.into());
        self.total_price += price;
        self.touch();
    }

    /// Remove one occurrence per requested id; ids not in the order are
    /// ignored. The current catalog price of each removed line is subtracted.
    /// Returns the ids actually removed.
    pub fn remove_products(&mut self, ids: &[String], prices: &PriceView) -> Vec<String> {
        let mut removed = Vec::new();
        for id in ids {
            if let Some(pos) = self.product_ids.iter().position(|p| p == id) {
                self.product_ids.remove(pos);
                self.total_price -= prices.get(id).copied().unwrap_or(Decimal::ZERO);
                removed.push(id.clone());
            }
        }
        if !removed.is_empty() {
            self.touch();
        }
        removed
    }

    /// Drop every line whose product is no longer available. Returns the
    /// distinct ids that were dropped; the total is not touched here — call
    /// [`Order::reprice`] afterwards.
    pub fn reconcile(&mut self, available: &PriceView) -> Vec<String> {
        let mut dropped: Vec<String> = Vec::new();
        self.product_ids.retain(|id| {
            if available.contains_key(id) {
                true
            } else {
                if !dropped.contains(id) {
                    dropped.push(id.clone());
                }
                false
            }
        });
        dropped
    }

    /// Recompute the total from the remaining lines and current prices.
    pub fn reprice(&mut self, prices: &PriceView) {
        self.total_price = self
            .product_ids
            .iter()
            .map(|id| prices.get(id).copied().unwrap_or(Decimal::ZERO))
            .sum();
        self.touch();
    }

    /// Attempt to submit the order against the current catalog view.
    ///
    /// Lines that went unavailable are dropped and the total recomputed; the
    /// order only transitions to submitted when nothing had to be dropped —
    /// otherwise the caller must surface the dropped ids so the user can
    /// recheck and resubmit.
    pub fn try_submit(&mut self, available: &PriceView) -> Vec<String> {
        let dropped = self.reconcile(available);
        if dropped.is_empty() {
            self.submitted = true;
            self.touch();
        } else {
            self.reprice(available);
        }
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    fn touch(&mut self) {
        self.ordered_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn dec(value: f64) -> Decimal {
        Decimal::from_f64(value).unwrap()
    }

    fn view(entries: &[(&str, f64)]) -> PriceView {
        entries
            .iter()
            .map(|(id, price)| (id.to_string(), dec(*price)))
            .collect()
    }

    #[test]
    fn test_new_order_is_empty_and_unsubmitted() {
        let order = Order::new("user-1");
        assert!(order.is_empty());
        assert!(!order.submitted);
        assert_eq!(order.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_add_products_accumulates_total() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(9.99));
        order.add_product("b", dec(5.01));
        assert_eq!(order.product_ids, vec!["a", "b"]);
        assert_eq!(order.total_price, dec(15.00));
    }

    #[test]
    fn test_duplicate_lines_are_allowed() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(10.0));
        order.add_product("a", dec(10.0));
        assert_eq!(order.product_ids.len(), 2);
        assert_eq!(order.total_price, dec(20.0));
    }

    #[test]
    fn test_remove_takes_one_occurrence_per_request() {
        let mut order = Order::new("user-1");
        let prices = view(&[("a", 10.0), ("b", 4.0)]);
        order.add_product("a", dec(10.0));
        order.add_product("a", dec(10.0));
        order.add_product("b", dec(4.0));

        let removed = order.remove_products(&["a".to_string()], &prices);
        assert_eq!(removed, vec!["a"]);
        assert_eq!(order.product_ids, vec!["a", "b"]);
        assert_eq!(order.total_price, dec(14.0));
    }

    #[test]
    fn test_remove_ignores_ids_not_in_order() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(10.0));

        let removed = order.remove_products(&["zzz".to_string()], &view(&[("a", 10.0)]));
        assert!(removed.is_empty());
        assert_eq!(order.total_price, dec(10.0));
    }

    #[test]
    fn test_reconcile_drops_all_occurrences_of_unavailable_lines() {
        let mut order = Order::new("user-1");
        order.add_product("gone", dec(3.0));
        order.add_product("a", dec(10.0));
        order.add_product("gone", dec(3.0));

        let dropped = order.reconcile(&view(&[("a", 10.0)]));
        assert_eq!(dropped, vec!["gone"]);
        assert_eq!(order.product_ids, vec!["a"]);
    }

    #[test]
    fn test_reprice_uses_current_catalog_prices() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(10.0));
        order.add_product("b", dec(5.0));

        // Price of "a" changed since the lines were added
        order.reprice(&view(&[("a", 12.0), ("b", 5.0)]));
        assert_eq!(order.total_price, dec(17.0));
    }

    #[test]
    fn test_submit_with_everything_available() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(10.0));

        let dropped = order.try_submit(&view(&[("a", 10.0)]));
        assert!(dropped.is_empty());
        assert!(order.submitted);
    }

    #[test]
    fn test_submit_with_unavailable_lines_stays_open() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(10.0));
        order.add_product("gone", dec(3.0));

        let dropped = order.try_submit(&view(&[("a", 10.0)]));
        assert_eq!(dropped, vec!["gone"]);
        assert!(!order.submitted);
        // Total recomputed from the surviving lines
        assert_eq!(order.total_price, dec(10.0));
        assert_eq!(order.product_ids, vec!["a"]);
    }

    #[test]
    fn test_resubmit_after_cleanup_succeeds() {
        let mut order = Order::new("user-1");
        order.add_product("a", dec(10.0));
        order.add_product("gone", dec(3.0));

        let available = view(&[("a", 10.0)]);
        let dropped = order.try_submit(&available);
        assert!(!dropped.is_empty());
        assert!(!order.submitted);

        let dropped = order.try_submit(&available);
        assert!(dropped.is_empty());
        assert!(order.submitted);
    }
}
