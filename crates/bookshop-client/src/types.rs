//! Wire types mirrored from the BookShop API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub annotation: String,
    pub language: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub available: bool,
    #[serde(default)]
    pub link: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// New or replacement product payload (admin surface)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    pub author: String,
    pub annotation: String,
    pub language: String,
    pub genres: Vec<String>,
    pub available: bool,
    pub link: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// One page of the catalog
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedBooks {
    pub data: Vec<Product>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Catalog count
#[derive(Debug, Clone, Deserialize)]
pub struct Count {
    pub count: u64,
}

/// Login result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub token: String,
    /// Expiration time, RFC 3339
    pub expiration: String,
}

/// Registration result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub login: String,
    pub email: String,
    pub roles: Vec<String>,
    pub message: String,
}

/// Registration payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub email: String,
    pub confirm_email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Order display model
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderModel {
    pub order_id: String,
    pub product_ids: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    /// Last transition time, RFC 3339
    pub ordered_at: String,
    pub submitted: bool,
    #[serde(default)]
    pub notes: String,
}

/// Order details with resolved products for the available lines
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderModel,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Generic success acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct Success {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Listing parameters for `/books/page`
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ascending: Option<bool>,
    /// price, title, or author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
}

/// Attribute filter for `/books/filter`
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_parses_server_shape() {
        let json = r#"{
            "id": "6651f0c2a7b9d53e9c1a0001",
            "title": "Dead Souls",
            "author": "Nikolai Gogol",
            "annotation": "",
            "language": "English",
            "genres": ["classics"],
            "available": true,
            "link": "about:blank",
            "price": 11.99
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.title, "Dead Souls");
        assert_eq!(product.price.to_string(), "11.99");
    }

    #[test]
    fn test_order_details_flattening() {
        let json = r#"{
            "orderId": "o-1",
            "productIds": ["a"],
            "totalPrice": 10.0,
            "orderedAt": "2026-01-01T00:00:00Z",
            "submitted": false,
            "notes": "",
            "products": []
        }"#;
        let details: OrderDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.order.order_id, "o-1");
        assert!(details.products.is_empty());
    }

    #[test]
    fn test_page_query_skips_unset_fields() {
        let query = serde_json::to_value(PageQuery {
            page: Some(2),
            ..PageQuery::default()
        })
        .unwrap();
        assert_eq!(query.as_object().unwrap().len(), 1);
    }
}
