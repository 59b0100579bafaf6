//! Product Entity
//!
//! Catalog document stored in MongoDB. The BSON field names (`book`,
//! `genre`, `available`) are the collection's wire format and must not
//! change.

use bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Genre recorded when a product is added without one.
pub const DEFAULT_GENRE: &str = "unspecified";

/// Link recorded when a product is added without a usable URL.
pub const BLANK_LINK: &str = "about:blank";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "book")]
    pub title: String,

    pub author: String,

    #[serde(default)]
    pub annotation: String,

    pub language: String,

    #[serde(rename = "genre", default)]
    pub genres: Vec<String>,

    #[serde(rename = "available")]
    pub available: bool,

    #[serde(default = "default_link")]
    pub link: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

fn default_link() -> String {
    BLANK_LINK.to_string()
}

impl Product {
    /// Normalize an incoming product before it is stored:
    /// empty genres become [`DEFAULT_GENRE`], a missing or relative link
    /// becomes [`BLANK_LINK`], and a negative price becomes zero.
    pub fn normalize(mut self) -> Self {
        if self.genres.iter().all(|g| g.trim().is_empty()) {
            self.genres = vec![DEFAULT_GENRE.to_string()];
        }
        if !is_absolute_url(&self.link) {
            self.link = BLANK_LINK.to_string();
        }
        if self.price < Decimal::ZERO {
            self.price = Decimal::ZERO;
        }
        self
    }

    /// Hex string form of the Mongo id, empty for unsaved products.
    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

fn is_absolute_url(link: &str) -> bool {
    link == BLANK_LINK || link.starts_with("http://") || link.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn product() -> Product {
        Product {
            id: None,
            title: "The Master and Margarita".to_string(),
            author: "Mikhail Bulgakov".to_string(),
            annotation: String::new(),
            language: "English".to_string(),
            genres: vec![],
            available: true,
            link: String::new(),
            price: Decimal::from_f64(12.99).unwrap(),
        }
    }

    #[test]
    fn test_normalize_fills_missing_genre_and_link() {
        let normalized = product().normalize();
        assert_eq!(normalized.genres, vec![DEFAULT_GENRE.to_string()]);
        assert_eq!(normalized.link, BLANK_LINK);
    }

    #[test]
    fn test_normalize_keeps_valid_values() {
        let mut p = product();
        p.genres = vec!["fantasy".to_string()];
        p.link = "https://example.com/book".to_string();
        let normalized = p.normalize();
        assert_eq!(normalized.genres, vec!["fantasy".to_string()]);
        assert_eq!(normalized.link, "https://example.com/book");
    }

    #[test]
    fn test_normalize_clamps_negative_price() {
        let mut p = product();
        p.price = Decimal::from_f64(-3.5).unwrap();
        assert_eq!(p.normalize().price, Decimal::ZERO);
    }

    #[test]
    fn test_relative_link_is_replaced() {
        let mut p = product();
        p.link = "catalog/book.html".to_string();
        assert_eq!(p.normalize().link, BLANK_LINK);
    }

    #[test]
    fn test_bson_field_names() {
        let mut p = product().normalize();
        p.id = Some(ObjectId::new());
        let doc = bson::to_document(&p).unwrap();
        // Collection wire format
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("book"));
        assert!(doc.contains_key("genre"));
        assert!(doc.contains_key("available"));
        assert!(!doc.contains_key("title"));
        // Price is stored numerically so the database can sort on it
        assert!(matches!(doc.get("price"), Some(bson::Bson::Double(_))));
    }
}
