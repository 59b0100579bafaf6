//! Stock Repository
//!
//! MongoDB access for the product catalog collection.

use bson::{doc, oid::ObjectId, Bson, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::catalog::entity::Product;
use crate::shared::error::Result;
use crate::shared::paging::SortKey;

/// Attribute filter for catalog queries (the `/books/filter` endpoint).
#[derive(Debug, Default, Clone)]
pub struct StockFilter {
    pub author: Option<String>,
    pub language: Option<String>,
    pub genre: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

pub struct StockRepository {
    collection: Collection<Product>,
}

impl StockRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection(collection_name),
        }
    }

    pub async fn find_all(&self, only_available: bool) -> Result<Vec<Product>> {
        let cursor = self.collection.find(availability_filter(only_available)).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_id(&self, id: &ObjectId) -> Result<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Fetch every product whose id is in `ids`, available or not.
    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let cursor = self
            .collection
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// One sorted page of the catalog.
    pub async fn find_page(
        &self,
        only_available: bool,
        sort: SortKey,
        ascending: bool,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Product>> {
        let cursor = self
            .collection
            .find(availability_filter(only_available))
            .sort(sort_doc(sort, ascending))
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self, only_available: bool) -> Result<u64> {
        Ok(self
            .collection
            .count_documents(availability_filter(only_available))
            .await?)
    }

    /// Sorted products whose title, author, language, or any genre matches
    /// the term; `exact` switches between whole-value and substring match,
    /// both case-insensitive.
    pub async fn search(
        &self,
        term: &str,
        exact: bool,
        only_available: bool,
        sort: SortKey,
        ascending: bool,
    ) -> Result<Vec<Product>> {
        let cursor = self
            .collection
            .find(search_filter(term, exact, only_available))
            .sort(sort_doc(sort, ascending))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Sorted products matching the attribute filter.
    pub async fn find_filtered(
        &self,
        filter: &StockFilter,
        only_available: bool,
        sort: SortKey,
        ascending: bool,
    ) -> Result<Vec<Product>> {
        let cursor = self
            .collection
            .find(attribute_filter(filter, only_available))
            .sort(sort_doc(sort, ascending))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn insert(&self, product: &Product) -> Result<Option<ObjectId>> {
        let result = self.collection.insert_one(product).await?;
        Ok(result.inserted_id.as_object_id())
    }

    /// Full replace by id. Returns false when no document matched.
    pub async fn replace(&self, product: &Product) -> Result<bool> {
        let Some(id) = product.id else {
            return Ok(false);
        };
        let result = self
            .collection
            .replace_one(doc! { "_id": id }, product)
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, id: &ObjectId) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

fn availability_filter(only_available: bool) -> Document {
    if only_available {
        doc! { "available": true }
    } else {
        doc! {}
    }
}

fn sort_doc(sort: SortKey, ascending: bool) -> Document {
    let field = match sort {
        SortKey::Price => "price",
        SortKey::Title => "book",
        SortKey::Author => "author",
    };
    let direction = if ascending { 1 } else { -1 };
    doc! { field: direction }
}

fn search_filter(term: &str, exact: bool, only_available: bool) -> Document {
    let escaped = regex::escape(term.trim());
    let pattern = if exact {
        format!("^{}$", escaped)
    } else {
        escaped
    };
    let matcher = doc! { "$regex": &pattern, "$options": "i" };

    let mut filter = doc! {
        "$or": [
            { "book": matcher.clone() },
            { "author": matcher.clone() },
            { "language": matcher.clone() },
            { "genre": matcher },
        ]
    };
    if only_available {
        filter.insert("available", true);
    }
    filter
}

fn attribute_filter(filter: &StockFilter, only_available: bool) -> Document {
    let mut query = Document::new();

    if only_available {
        query.insert("available", true);
    }
    if let Some(author) = &filter.author {
        query.insert("author", doc! { "$regex": regex::escape(author.trim()), "$options": "i" });
    }
    if let Some(language) = &filter.language {
        query.insert("language", doc! { "$regex": regex::escape(language.trim()), "$options": "i" });
    }
    if let Some(genre) = &filter.genre {
        query.insert("genre", doc! { "$regex": regex::escape(genre.trim()), "$options": "i" });
    }

    let mut price = Document::new();
    if let Some(min) = filter.min_price.and_then(|d| d.to_f64()) {
        price.insert("$gte", Bson::Double(min));
    }
    if let Some(max) = filter.max_price.and_then(|d| d.to_f64()) {
        price.insert("$lte", Bson::Double(max));
    }
    if !price.is_empty() {
        query.insert("price", price);
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn test_availability_filter() {
        assert!(availability_filter(false).is_empty());
        assert_eq!(availability_filter(true), doc! { "available": true });
    }

    #[test]
    fn test_sort_doc_maps_wire_field_names() {
        assert_eq!(sort_doc(SortKey::Price, false), doc! { "price": -1 });
        assert_eq!(sort_doc(SortKey::Title, true), doc! { "book": 1 });
        assert_eq!(sort_doc(SortKey::Author, true), doc! { "author": 1 });
    }

    #[test]
    fn test_search_filter_escapes_regex_metacharacters() {
        let filter = search_filter("C++ (2nd ed.)", false, false);
        let or = filter.get_array("$or").unwrap();
        let title = or[0].as_document().unwrap().get_document("book").unwrap();
        let pattern = title.get_str("$regex").unwrap();
        assert!(pattern.contains(r"C\+\+"));
        assert!(pattern.contains(r"\(2nd ed\.\)"));
    }

    #[test]
    fn test_exact_search_anchors_the_pattern() {
        let filter = search_filter(" english ", true, true);
        let or = filter.get_array("$or").unwrap();
        let language = or[2].as_document().unwrap().get_document("language").unwrap();
        assert_eq!(language.get_str("$regex").unwrap(), "^english$");
        // Availability constraint rides along
        assert_eq!(filter.get_bool("available").unwrap(), true);
    }

    #[test]
    fn test_attribute_filter_price_range() {
        let filter = StockFilter {
            min_price: Decimal::from_f64(5.0),
            max_price: Decimal::from_f64(20.0),
            ..StockFilter::default()
        };
        let query = attribute_filter(&filter, true);
        let price = query.get_document("price").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 5.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 20.0);
    }

    #[test]
    fn test_attribute_filter_empty_is_empty() {
        let query = attribute_filter(&StockFilter::default(), false);
        assert!(query.is_empty());
    }
}
