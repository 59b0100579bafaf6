//! Orders REST API
//!
//! The order lifecycle: create -> add/remove products -> submit. Every
//! transition re-validates the lines against the catalog and recomputes the
//! total; lines whose product disappeared or went unavailable are dropped
//! and reported back in the `notes` field.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::catalog::api::ProductResponse;
use crate::catalog::entity::Product;
use crate::catalog::repository::StockRepository;
use crate::order::entity::{Order, PriceView};
use crate::order::repository::OrderRepository;
use crate::shared::error::{Result, ShopError};
use crate::shared::middleware::Authenticated;

/// Orders service state
#[derive(Clone)]
pub struct OrdersState {
    pub orders: Arc<dyn OrderRepository>,
    pub stock: Arc<StockRepository>,
}

/// Create order request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub product_ids: Vec<String>,
}

/// Add/remove products request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModifyOrderRequest {
    pub order_id: String,
    pub product_ids: Vec<String>,
}

/// Submit order request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
    pub order_id: String,
}

/// Order details query
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "snake_case")]
#[into_params(parameter_in = Query)]
pub struct OrderDetailsQuery {
    pub order_id: String,
}

/// Order display model
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub product_ids: Vec<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    /// Last transition time, RFC 3339
    pub ordered_at: String,
    pub submitted: bool,
    /// Availability and status messages accumulated by the operation
    pub notes: String,
}

impl OrderResponse {
    fn new(order: &Order, notes: impl Into<String>) -> Self {
        Self {
            order_id: order.order_id.clone(),
            product_ids: order.product_ids.clone(),
            total_price: order.total_price,
            ordered_at: order.ordered_at.to_rfc3339(),
            submitted: order.submitted,
            notes: notes.into(),
        }
    }
}

/// Order details with resolved product data for the available lines
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailsResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub products: Vec<ProductResponse>,
}

/// Fetch the catalog documents behind a set of product id strings.
/// Ids that do not parse as ObjectIds simply come back absent.
async fn load_products(
    stock: &StockRepository,
    ids: impl IntoIterator<Item = String>,
) -> Result<HashMap<String, Product>> {
    let mut object_ids: Vec<ObjectId> = Vec::new();
    for id in ids {
        if let Ok(oid) = ObjectId::parse_str(&id) {
            if !object_ids.contains(&oid) {
                object_ids.push(oid);
            }
        }
    }

    let products = stock.find_by_ids(&object_ids).await?;
    Ok(products
        .into_iter()
        .map(|p| (p.id_hex(), p))
        .collect())
}

/// Catalog view of the products that exist and are available.
fn available_view(products: &HashMap<String, Product>) -> PriceView {
    products
        .iter()
        .filter(|(_, p)| p.available)
        .map(|(id, p)| (id.clone(), p.price))
        .collect()
}

fn unavailable_note(ids: &[String], submitted: bool) -> String {
    if ids.is_empty() {
        return String::new();
    }
    let list = ids.join(", ");
    if submitted {
        format!(
            "Some products from this order are currently unavailable in stock; \
             no detailed data can be displayed for product ids: {}. ",
            list
        )
    } else {
        format!(
            "Some products from this order are currently unavailable in stock; \
             they were removed and the total price was recomputed. Removed product ids: {}. ",
            list
        )
    }
}

/// Load an order that the caller may modify: it must exist, belong to the
/// caller, and not be submitted yet.
async fn load_open_order(
    state: &OrdersState,
    auth: &Authenticated,
    order_id: &str,
) -> Result<Order> {
    let order = state
        .orders
        .find_by_id(order_id)
        .await?
        .filter(|o| o.user_id == auth.user_id);

    match order {
        Some(order) if !order.submitted => Ok(order),
        Some(_) => Err(ShopError::validation(format!(
            "The order with id {} is already submitted. Please start a new order",
            order_id
        ))),
        None => Err(ShopError::validation(format!(
            "The order with id {} was not found. Please start a new order",
            order_id
        ))),
    }
}

/// Create a new order
///
/// A user can have only one unsubmitted order at a time; every requested
/// product must exist and be available or nothing is saved.
#[utoipa::path(
    post,
    path = "/order",
    tag = "orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 404, description = "A requested product is unknown or unavailable"),
        (status = 409, description = "An unsubmitted order already exists")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn create_order(
    State(state): State<OrdersState>,
    auth: Authenticated,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    // One open order per user
    if let Some(open) = state.orders.find_unsubmitted_by_user(&auth.user_id).await? {
        return Err(ShopError::duplicate(
            "Order",
            "unsubmittedOrderId",
            open.order_id,
        ));
    }

    let products = load_products(&state.stock, req.product_ids.iter().cloned()).await?;

    let mut order = Order::new(&auth.user_id);
    for id in &req.product_ids {
        match products.get(id) {
            Some(product) if product.available => {
                order.add_product(id.clone(), product.price);
            }
            Some(_) => {
                return Err(ShopError::no_results(format!(
                    "The product with id {} is currently unavailable. Unable to process the order",
                    id
                )));
            }
            None => {
                return Err(ShopError::no_results(format!(
                    "The product with id {} was not found in stock, please check the id. \
                     Unable to process the order",
                    id
                )));
            }
        }
    }

    state.orders.insert(&order).await?;
    tracing::info!(order_id = %order.order_id, user = %auth.username, "Order created");

    let response = OrderResponse::new(&order, "Order created successfully");
    Ok((StatusCode::CREATED, Json(response)))
}

/// Add products to an open order
///
/// Lines that went unavailable since the last transition are dropped first;
/// requested products that are unknown or unavailable are skipped. Both are
/// reported in `notes`. The total price is recomputed from current prices.
#[utoipa::path(
    put,
    path = "/order/products/add",
    tag = "orders",
    request_body = ModifyOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Order unknown, foreign, or already submitted")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn add_order_products(
    State(state): State<OrdersState>,
    auth: Authenticated,
    Json(req): Json<ModifyOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let mut order = load_open_order(&state, &auth, &req.order_id).await?;

    let products = load_products(
        &state.stock,
        order.product_ids.iter().chain(req.product_ids.iter()).cloned(),
    )
    .await?;
    let available = available_view(&products);

    let mut notes = String::new();

    // Previously added lines may have gone unavailable in the meantime
    let dropped = order.reconcile(&available);
    notes.push_str(&unavailable_note(&dropped, order.submitted));

    for id in &req.product_ids {
        if available.contains_key(id) {
            order.product_ids.push(id.clone());
        } else {
            let reason = if products.contains_key(id) {
                "is currently unavailable"
            } else {
                "was not found in stock, please check the id"
            };
            notes.push_str(&format!(
                "The product with id {} was not added to the order because it {}. ",
                id, reason
            ));
        }
    }

    order.reprice(&available);
    state.orders.update(&order).await?;
    tracing::info!(order_id = %order.order_id, user = %auth.username, "Order lines added");

    notes.push_str("Order updated successfully");
    Ok(Json(OrderResponse::new(&order, notes)))
}

/// Remove products from an open order
///
/// One line is removed per requested id; ids not present in the order are
/// ignored. The current catalog price of each removed line is subtracted.
#[utoipa::path(
    put,
    path = "/order/products/delete",
    tag = "orders",
    request_body = ModifyOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Order unknown, foreign, or already submitted")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn remove_order_products(
    State(state): State<OrdersState>,
    auth: Authenticated,
    Json(req): Json<ModifyOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let mut order = load_open_order(&state, &auth, &req.order_id).await?;

    let products = load_products(&state.stock, req.product_ids.iter().cloned()).await?;
    let prices: PriceView = products
        .iter()
        .map(|(id, p)| (id.clone(), p.price))
        .collect();

    let removed = order.remove_products(&req.product_ids, &prices);
    state.orders.update(&order).await?;
    tracing::info!(
        order_id = %order.order_id,
        user = %auth.username,
        removed = removed.len(),
        "Order lines removed"
    );

    let notes = format!("Removed {} product(s) from the order", removed.len());
    Ok(Json(OrderResponse::new(&order, notes)))
}

/// Submit an open order
///
/// Lines that went unavailable are removed first. When anything had to be
/// removed the order stays unsubmitted with a recomputed total and the
/// response asks the user to recheck and resubmit; otherwise the order is
/// submitted.
#[utoipa::path(
    put,
    path = "/order/submit",
    tag = "orders",
    request_body = SubmitOrderRequest,
    responses(
        (status = 200, description = "Order submitted", body = OrderResponse),
        (status = 400, description = "Order unknown, foreign, empty, or already submitted"),
        (status = 404, description = "Unavailable lines were removed; recheck and resubmit")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn submit_order(
    State(state): State<OrdersState>,
    auth: Authenticated,
    Json(req): Json<SubmitOrderRequest>,
) -> Result<Json<OrderResponse>> {
    let mut order = load_open_order(&state, &auth, &req.order_id).await?;

    if order.is_empty() {
        return Err(ShopError::validation(
            "Cannot submit an empty order; an order needs at least one product",
        ));
    }

    let products = load_products(&state.stock, order.product_ids.iter().cloned()).await?;
    let dropped = order.try_submit(&available_view(&products));
    state.orders.update(&order).await?;

    if !order.submitted {
        // The cleaned-up order is saved; the user has to confirm what is left
        return Err(ShopError::no_results(format!(
            "The products with ids {} were not found or are currently unavailable and were \
             removed from the order. The order was not submitted; please recheck it and resubmit",
            dropped.join(", ")
        )));
    }

    tracing::info!(order_id = %order.order_id, user = %auth.username, "Order submitted");
    Ok(Json(OrderResponse::new(&order, "Order submitted successfully")))
}

/// Fetch order details
///
/// Owners (or admins) only. When an unsubmitted order carries lines that
/// went unavailable, the stored order is rewritten to the surviving lines
/// with a recomputed total and the response notes the removal.
#[utoipa::path(
    get,
    path = "/order/details",
    tag = "orders",
    params(OrderDetailsQuery),
    responses(
        (status = 200, description = "Order details", body = OrderDetailsResponse),
        (status = 403, description = "Not the order's owner"),
        (status = 404, description = "Order not found")
    ),
    security(("api_key" = []), ("bearer_auth" = []))
)]
pub async fn order_details(
    State(state): State<OrdersState>,
    auth: Authenticated,
    Query(query): Query<OrderDetailsQuery>,
) -> Result<Json<OrderDetailsResponse>> {
    let mut order = state
        .orders
        .find_by_id(&query.order_id)
        .await?
        .ok_or_else(|| ShopError::not_found("Order", &query.order_id))?;

    if order.user_id != auth.user_id && !auth.is_admin() {
        return Err(ShopError::forbidden("This order belongs to another account"));
    }

    let products = load_products(&state.stock, order.product_ids.iter().cloned()).await?;
    let available = available_view(&products);

    let missing: Vec<String> = order
        .product_ids
        .iter()
        .filter(|id| !available.contains_key(*id))
        .cloned()
        .collect();

    let mut notes = String::new();
    if !missing.is_empty() && !order.submitted {
        let dropped = order.reconcile(&available);
        order.reprice(&available);
        state.orders.update(&order).await?;
        notes = unavailable_note(&dropped, false);
    } else if !missing.is_empty() {
        notes = unavailable_note(&missing, true);
    }

    let line_products: Vec<ProductResponse> = order
        .product_ids
        .iter()
        .filter_map(|id| products.get(id))
        .filter(|p| p.available)
        .cloned()
        .map(Into::into)
        .collect();

    Ok(Json(OrderDetailsResponse {
        order: OrderResponse::new(&order, notes),
        products: line_products,
    }))
}

/// Create the orders router
pub fn orders_router(state: OrdersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_order))
        .routes(routes!(add_order_products))
        .routes(routes!(remove_order_products))
        .routes(routes!(submit_order))
        .routes(routes!(order_details))
        .with_state(state)
}
