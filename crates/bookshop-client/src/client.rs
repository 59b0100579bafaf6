//! High-level BookShop client

use crate::auth::TokenManager;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{
    Count, FilterQuery, NewProduct, OrderDetails, OrderModel, PagedBooks, PageQuery, Product,
    Registered, RegisterRequest, Success,
};
use serde_json::json;
use std::sync::Arc;

/// BookShop API client
///
/// Provides a typed interface to the BookShop API with automatic
/// authentication, gateway headers, retries, and error handling.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<Config>,
    token_manager: Option<Arc<TokenManager>>,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new BookShop client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let token_manager = match (&config.login, &config.password) {
            (Some(login), Some(password)) => Some(Arc::new(TokenManager::new(
                login.clone(),
                password.clone(),
                format!("{}/authorization/login", config.base_url),
                config.api_key.clone(),
                config.surface.header_value(),
                http_client.clone(),
            ))),
            _ => None,
        };

        Ok(Self {
            config: Arc::new(config),
            token_manager,
            http_client,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Build a request with the gateway headers and, when credentials are
    /// configured, a bearer token.
    async fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = format!("{}{}", self.config.base_url, path);
        let mut builder = self
            .http_client
            .request(method, url)
            .header(bookshop_common::API_KEY_HEADER, &self.config.api_key)
            .header(
                bookshop_common::API_VERSION_HEADER,
                self.config.surface.header_value(),
            );

        if let Some(tokens) = &self.token_manager {
            let token = tokens.get_token().await?;
            builder = builder.bearer_auth(token);
        }

        Ok(builder)
    }

    /// Execute a request with retries and error mapping
    async fn execute<T>(&self, request: reqwest::Request) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..self.config.retry_attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * (1 << (attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let request = request
                .try_clone()
                .ok_or_else(|| Error::Other("Request cannot be cloned".into()))?;

            match self.http_client.execute(request).await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let body: T = response.json().await?;
                        return Ok(body);
                    }

                    // A stale token gets one refresh
                    if status == reqwest::StatusCode::UNAUTHORIZED && attempt == 0 {
                        if let Some(tokens) = &self.token_manager {
                            tokens.invalidate_token().await;
                            continue;
                        }
                    }

                    let body = response.text().await.unwrap_or_default();
                    let error = Error::from_status(status, body);

                    if !error.is_retryable() {
                        return Err(error);
                    }

                    last_error = Some(error);
                }
                Err(e) => {
                    last_error = Some(Error::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Other("Request failed".into())))
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.request(reqwest::Method::GET, path).await?.build()?;
        self.execute(request).await
    }

    async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        Q: serde::Serialize,
    {
        let request = self
            .request(reqwest::Method::GET, path)
            .await?
            .query(query)
            .build()?;
        self.execute(request).await
    }

    async fn send_json<T, B>(&self, method: reqwest::Method, path: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let request = self.request(method, path).await?.json(body).build()?;
        self.execute(request).await
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// List the whole catalog
    pub async fn books_all(&self) -> Result<Vec<Product>> {
        self.get("/books/all").await
    }

    /// One sorted page of the catalog
    pub async fn books_page(&self, query: &PageQuery) -> Result<PagedBooks> {
        self.get_with_query("/books/page", query).await
    }

    /// Count catalog products
    pub async fn books_count(&self) -> Result<u64> {
        let count: Count = self.get("/books/count/all").await?;
        Ok(count.count)
    }

    /// Fetch one product by id
    pub async fn book_by_id(&self, id: &str) -> Result<Product> {
        self.get_with_query("/book/id", &[("id", id)]).await
    }

    /// Search the catalog by term
    pub async fn search_books(&self, term: &str, exact: bool) -> Result<Vec<Product>> {
        self.get_with_query(
            "/books/search",
            &json!({ "term": term, "exact": exact }),
        )
        .await
    }

    /// Filter the catalog by attributes
    pub async fn filter_books(&self, filter: &FilterQuery) -> Result<Vec<Product>> {
        self.get_with_query("/books/filter", filter).await
    }

    /// Add a product (admin surface)
    pub async fn add_book(&self, product: &NewProduct) -> Result<Product> {
        self.send_json(reqwest::Method::POST, "/book/add", product).await
    }

    /// Replace a product (admin surface)
    pub async fn update_book(&self, id: &str, product: &NewProduct) -> Result<Product> {
        let mut body = serde_json::to_value(product)?;
        body["id"] = json!(id);
        self.send_json(reqwest::Method::PUT, "/book/update", &body).await
    }

    /// Delete a product and return it (admin surface)
    pub async fn delete_book(&self, id: &str) -> Result<Product> {
        let request = self
            .request(reqwest::Method::DELETE, "/book/delete")
            .await?
            .query(&[("id", id)])
            .build()?;
        self.execute(request).await
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    /// Register a new account on the configured surface
    pub async fn register(&self, request: &RegisterRequest) -> Result<Registered> {
        self.send_json(reqwest::Method::POST, "/authorization/register", request)
            .await
    }

    /// Change the signed-in account's password
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<Success> {
        self.send_json(
            reqwest::Method::PUT,
            "/authorization/password/reset",
            &json!({
                "currentPassword": current_password,
                "newPassword": new_password,
                "confirmPassword": new_password,
            }),
        )
        .await
    }

    /// Change another account's password (admin surface)
    pub async fn change_password_for(
        &self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<Success> {
        self.send_json(
            reqwest::Method::PUT,
            "/authorization/password/reset/foranother",
            &json!({
                "email": email,
                "currentPassword": current_password,
                "newPassword": new_password,
                "confirmPassword": new_password,
            }),
        )
        .await
    }

    /// Delete the signed-in account and its orders
    pub async fn delete_account(&self, password: &str) -> Result<Success> {
        self.send_json(
            reqwest::Method::DELETE,
            "/authorization/account/delete",
            &json!({ "password": password, "confirmDelete": true }),
        )
        .await
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Create a new order from product ids
    pub async fn create_order(&self, product_ids: &[String]) -> Result<OrderModel> {
        self.send_json(
            reqwest::Method::POST,
            "/account/order",
            &json!({ "productIds": product_ids }),
        )
        .await
    }

    /// Add products to an open order
    pub async fn add_order_products(
        &self,
        order_id: &str,
        product_ids: &[String],
    ) -> Result<OrderModel> {
        self.send_json(
            reqwest::Method::PUT,
            "/account/order/products/add",
            &json!({ "orderId": order_id, "productIds": product_ids }),
        )
        .await
    }

    /// Remove products from an open order
    pub async fn remove_order_products(
        &self,
        order_id: &str,
        product_ids: &[String],
    ) -> Result<OrderModel> {
        self.send_json(
            reqwest::Method::PUT,
            "/account/order/products/delete",
            &json!({ "orderId": order_id, "productIds": product_ids }),
        )
        .await
    }

    /// Submit an open order
    pub async fn submit_order(&self, order_id: &str) -> Result<OrderModel> {
        self.send_json(
            reqwest::Method::PUT,
            "/account/order/submit",
            &json!({ "orderId": order_id }),
        )
        .await
    }

    /// Fetch order details
    pub async fn order_details(&self, order_id: &str) -> Result<OrderDetails> {
        self.get_with_query("/account/order/details", &[("order_id", order_id)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Surface;

    #[test]
    fn test_client_without_credentials_has_no_token_manager() {
        let client = Client::new(Config::new("http://localhost:8080", "key", Surface::Guest))
            .unwrap();
        assert!(client.token_manager.is_none());
    }

    #[test]
    fn test_client_with_credentials_builds_token_manager() {
        let config = Config::new("http://localhost:8080", "key", Surface::User)
            .with_credentials("reader", "pw");
        let client = Client::new(config).unwrap();
        assert!(client.token_manager.is_some());
    }
}
