//! Catalog REST API
//!
//! Listing, search, and admin mutations for the book catalog. The API
//! version header selects the surface: version 1 (admin) sees the whole
//! collection and may mutate it, version 2 (shopper) and version 3 (guest)
//! only see available products; guests need no token.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bson::oid::ObjectId;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::catalog::entity::Product;
use crate::catalog::repository::{StockFilter, StockRepository};
use crate::shared::error::{Result, ShopError};
use crate::shared::middleware::{checks, ApiVersion, Authenticated, AuthContext, OptionalAuth, Versioned};
use crate::shared::paging::{PageParams, PageWindow, SortKey};

/// Catalog service state
#[derive(Clone)]
pub struct CatalogState {
    pub stock: Arc<StockRepository>,
}

/// Product response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub title: String,
    pub author: String,
    pub annotation: String,
    pub language: String,
    pub genres: Vec<String>,
    pub available: bool,
    pub link: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id_hex(),
            title: p.title,
            author: p.author,
            annotation: p.annotation,
            language: p.language,
            genres: p.genres,
            available: p.available,
            link: p.link,
            price: p.price,
        }
    }
}

/// Paged catalog response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedBooksResponse {
    pub data: Vec<ProductResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Create/update payload for a product
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpsertRequest {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub annotation: String,
    pub language: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub link: String,
    #[schema(value_type = f64)]
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl ProductUpsertRequest {
    fn into_product(self, id: Option<ObjectId>) -> Product {
        Product {
            id,
            title: self.title,
            author: self.author,
            annotation: self.annotation,
            language: self.language,
            genres: self.genres,
            available: self.available,
            link: self.link,
            price: self.price,
        }
        .normalize()
    }
}

/// Update payload: the id plus the new document
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateRequest {
    pub id: String,
    #[serde(flatten)]
    pub product: ProductUpsertRequest,
}

/// Single-id query parameter
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdQuery {
    /// Product id (Mongo ObjectId hex)
    pub id: String,
}

/// Search query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "snake_case")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Term matched against title, author, language, and genres
    pub term: String,

    /// Whole-value match instead of substring match
    #[serde(default)]
    pub exact: bool,

    #[serde(default)]
    pub ascending: bool,

    #[serde(default)]
    pub order_by: SortKey,
}

/// Attribute filter query parameters
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "snake_case")]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    pub author: Option<String>,
    pub language: Option<String>,
    pub genre: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,

    #[serde(default)]
    pub ascending: bool,

    #[serde(default)]
    pub order_by: SortKey,
}

impl FilterParams {
    fn to_filter(&self) -> StockFilter {
        StockFilter {
            author: self.author.clone(),
            language: self.language.clone(),
            genre: self.genre.clone(),
            min_price: self.min_price.and_then(Decimal::from_f64),
            max_price: self.max_price.and_then(Decimal::from_f64),
        }
    }
}

/// Resolve read access for the requested surface.
///
/// Returns whether results must be restricted to available products.
fn catalog_read_access(version: ApiVersion, auth: &Option<AuthContext>) -> Result<bool> {
    match version {
        ApiVersion::Admin => {
            let ctx = auth
                .as_ref()
                .ok_or_else(|| ShopError::unauthorized("Missing authentication token"))?;
            checks::require_admin(ctx)?;
            Ok(false)
        }
        ApiVersion::User => {
            auth.as_ref()
                .ok_or_else(|| ShopError::unauthorized("Missing authentication token"))?;
            Ok(true)
        }
        ApiVersion::Guest => Ok(true),
    }
}

fn parse_product_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| ShopError::validation(format!("Invalid product id: {}", id)))
}

/// List the whole catalog
///
/// Version 1 returns every product; versions 2 and 3 return available
/// products only. Responds 404 when nothing matches.
#[utoipa::path(
    get,
    path = "/books/all",
    tag = "catalog",
    responses(
        (status = 200, description = "Products", body = Vec<ProductResponse>),
        (status = 404, description = "No products found")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn list_all_books(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Json<Vec<ProductResponse>>> {
    let only_available = catalog_read_access(version, &auth)?;

    let products = state.stock.find_all(only_available).await?;
    if products.is_empty() {
        return Err(ShopError::no_results("There are no products in stock"));
    }

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// One sorted page of the catalog
///
/// Page and page size clamp against the collection size; sorting defaults to
/// descending price.
#[utoipa::path(
    get,
    path = "/books/page",
    tag = "catalog",
    params(PageParams),
    responses(
        (status = 200, description = "Requested page", body = PagedBooksResponse),
        (status = 404, description = "No products found under the entered requirements")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn page_books(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    OptionalAuth(auth): OptionalAuth,
    Query(params): Query<PageParams>,
) -> Result<Json<PagedBooksResponse>> {
    let only_available = catalog_read_access(version, &auth)?;

    let total = state.stock.count(only_available).await?;
    let window = PageWindow::for_params(&params, total);
    if window.total_pages == 0 {
        return Err(ShopError::no_results(
            "There are no products found under the entered requirements",
        ));
    }

    let products = state
        .stock
        .find_page(
            only_available,
            params.order_by,
            params.ascending,
            window.skip(),
            window.limit(),
        )
        .await?;

    Ok(Json(PagedBooksResponse {
        data: products.into_iter().map(Into::into).collect(),
        page: window.page,
        per_page: window.per_page,
        total: window.total,
        total_pages: window.total_pages,
    }))
}

/// Count catalog products
#[utoipa::path(
    get,
    path = "/books/count/all",
    tag = "catalog",
    responses(
        (status = 200, description = "Product count", body = crate::shared::api_common::CountResponse)
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn count_books(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    OptionalAuth(auth): OptionalAuth,
) -> Result<Json<crate::shared::api_common::CountResponse>> {
    let only_available = catalog_read_access(version, &auth)?;
    let count = state.stock.count(only_available).await?;
    Ok(Json(crate::shared::api_common::CountResponse { count }))
}

/// Fetch one product by id
#[utoipa::path(
    get,
    path = "/book/id",
    tag = "catalog",
    params(IdQuery),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 400, description = "Invalid product id"),
        (status = 404, description = "No product found under the entered requirements")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn get_book(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<IdQuery>,
) -> Result<Json<ProductResponse>> {
    let only_available = catalog_read_access(version, &auth)?;

    let id = parse_product_id(&query.id)?;
    let product = state
        .stock
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ShopError::not_found("Product", &query.id))?;

    // Shoppers and guests never see withdrawn products
    if only_available && !product.available {
        return Err(ShopError::not_found("Product", &query.id));
    }

    Ok(Json(product.into()))
}

/// Search the catalog
///
/// Matches the term against title, author, language, and genres.
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "catalog",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductResponse>)
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn search_books(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    OptionalAuth(auth): OptionalAuth,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ProductResponse>>> {
    let only_available = catalog_read_access(version, &auth)?;

    if params.term.trim().is_empty() {
        return Err(ShopError::validation("Search term must not be empty"));
    }

    let products = state
        .stock
        .search(
            &params.term,
            params.exact,
            only_available,
            params.order_by,
            params.ascending,
        )
        .await?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// Filter the catalog by attributes
#[utoipa::path(
    get,
    path = "/books/filter",
    tag = "catalog",
    params(FilterParams),
    responses(
        (status = 200, description = "Matching products", body = Vec<ProductResponse>)
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn filter_books(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    OptionalAuth(auth): OptionalAuth,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<ProductResponse>>> {
    let only_available = catalog_read_access(version, &auth)?;

    let products = state
        .stock
        .find_filtered(
            &params.to_filter(),
            only_available,
            params.order_by,
            params.ascending,
        )
        .await?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// Add a product (admin, version 1 only)
#[utoipa::path(
    post,
    path = "/book/add",
    tag = "catalog",
    request_body = ProductUpsertRequest,
    responses(
        (status = 201, description = "Product added", body = ProductResponse),
        (status = 403, description = "Not an admin or wrong API version")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn add_book(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    auth: Authenticated,
    Json(req): Json<ProductUpsertRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    checks::require_admin_surface(version)?;
    checks::require_admin(&auth)?;

    let mut product = req.into_product(None);
    product.id = state.stock.insert(&product).await?;
    tracing::info!(product_id = %product.id_hex(), title = %product.title, "Product added");

    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Replace a product (admin, version 1 only)
#[utoipa::path(
    put,
    path = "/book/update",
    tag = "catalog",
    request_body = ProductUpdateRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 403, description = "Not an admin or wrong API version")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn update_book(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    auth: Authenticated,
    Json(req): Json<ProductUpdateRequest>,
) -> Result<Json<ProductResponse>> {
    checks::require_admin_surface(version)?;
    checks::require_admin(&auth)?;

    let id = parse_product_id(&req.id)?;
    let product = req.product.into_product(Some(id));
    if !state.stock.replace(&product).await? {
        return Err(ShopError::not_found("Product", id.to_hex()));
    }
    tracing::info!(product_id = %product.id_hex(), "Product updated");

    Ok(Json(product.into()))
}

/// Delete a product (admin, version 1 only)
///
/// Returns the deleted product.
#[utoipa::path(
    delete,
    path = "/book/delete",
    tag = "catalog",
    params(IdQuery),
    responses(
        (status = 200, description = "Product deleted", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 403, description = "Not an admin or wrong API version")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn delete_book(
    State(state): State<CatalogState>,
    Versioned(version): Versioned,
    auth: Authenticated,
    Query(query): Query<IdQuery>,
) -> Result<Json<ProductResponse>> {
    checks::require_admin_surface(version)?;
    checks::require_admin(&auth)?;

    let id = parse_product_id(&query.id)?;
    let product = state
        .stock
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ShopError::not_found("Product", &query.id))?;

    state.stock.delete(&id).await?;
    tracing::info!(product_id = %query.id, "Product deleted");

    Ok(Json(product.into()))
}

/// Create the catalog router
pub fn catalog_router(state: CatalogState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_all_books))
        .routes(routes!(page_books))
        .routes(routes!(count_books))
        .routes(routes!(search_books))
        .routes(routes!(filter_books))
        .routes(routes!(get_book))
        .routes(routes!(add_book))
        .routes(routes!(update_book))
        .routes(routes!(delete_book))
        .with_state(state)
}
