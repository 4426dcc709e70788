//! Catalog service GraphQL client implementation.
//!
//! Raw GraphQL documents over `reqwest` with a generic `execute`, a bearer
//! token slot synced from the session, and a `moka` cache (5-minute TTL) in
//! front of the read-side product queries. Mutations are never cached.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use green_mango_core::{OrderId, OrderStatus, ProductId, ProfileId};

use crate::api::{ApiError, GraphQLError, queries, types};
use crate::basket::ProductDetailGateway;
use crate::catalog::{CatalogGateway, CatalogQuery};
use crate::config::ClientConfig;
use crate::models::{CartLine, Order, Product, ProductPage, Profile};
use crate::orders::OrderGateway;

const CACHE_CAPACITY: u64 = 1000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Client for the catalog service GraphQL API.
///
/// Cheaply cloneable; clones share the HTTP connection pool, the token slot
/// and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    http: reqwest::Client,
    endpoint: String,
    token: RwLock<Option<SecretString>>,
    cache: Cache<String, CacheEntry>,
}

/// Cached value types for read-side queries.
#[derive(Debug, Clone)]
enum CacheEntry {
    Page(ProductPage),
    Product(Box<Product>),
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    errors: Option<Vec<WireGraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct WireGraphQLError {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

impl From<WireGraphQLError> for GraphQLError {
    fn from(wire: WireGraphQLError) -> Self {
        Self {
            message: wire.message,
            path: wire.path,
        }
    }
}

impl CatalogClient {
    /// Create a new client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                http,
                endpoint: config.graphql_url.clone(),
                token: RwLock::new(None),
                cache,
            }),
        }
    }

    // =========================================================================
    // Token Management
    // =========================================================================

    /// Attach the session token to subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Stop attaching a token (logout).
    pub fn clear_token(&self) {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn bearer_header(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL document.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the service rejects the
    /// credentials, `ApiError::RateLimited` on throttling, `ApiError::GraphQL`
    /// when the response carries errors, and `ApiError::Http`/`Parse` on
    /// transport failures.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ApiError> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let mut request = self
            .inner
            .http
            .post(&self.inner.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(bearer) = self.bearer_header() {
            request = request.header("Authorization", bearer);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ApiError::Unauthorized(format!(
                "request rejected with HTTP {status}"
            )));
        }

        // Read the body as text first for better error diagnostics.
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "catalog service returned non-success status"
            );
            return Err(ApiError::GraphQL(vec![GraphQLError::message(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            ))]));
        }

        let envelope: Envelope<T> = match serde_json::from_str(&response_text) {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "failed to parse GraphQL response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        if let Some(errors) = envelope.errors
            && !errors.is_empty()
        {
            tracing::debug!(?errors, "GraphQL errors in response");
            return Err(ApiError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        envelope.data.ok_or_else(|| {
            ApiError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Product Queries (cached)
    // =========================================================================

    /// Fetch one page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products_page(&self, query: &CatalogQuery) -> Result<ProductPage, ApiError> {
        let cache_key = products_cache_key(query);

        if let Some(CacheEntry::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products page");
            return Ok(page);
        }

        let data: types::ProductsData = self
            .execute(queries::GET_PRODUCTS, products_variables(query))
            .await?;
        let page = ProductPage::from(data.products.get_many);

        self.inner
            .cache
            .insert(cache_key, CacheEntry::Page(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch a single product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheEntry::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data: types::ProductDetailData = self
            .execute(queries::GET_PRODUCT, json!({ "getOneId": id }))
            .await?;

        let product = data
            .products
            .get_one
            .map(Product::from)
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheEntry::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop all cached product data (e.g. after the catalog is known to
    /// have changed).
    pub async fn invalidate_products(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Order Operations (not cached - mutable state)
    // =========================================================================

    /// Fetch the orders visible to the ambient session. Ownerless records
    /// are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let data: types::OrdersData = self
            .execute(queries::GET_ORDERS, json!({ "input": {} }))
            .await?;
        Ok(data
            .orders
            .get_many
            .data
            .into_iter()
            .filter_map(types::OrderWire::into_order)
            .collect())
    }

    /// Create an order from cart lines, returning the new order's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, lines))]
    pub async fn create_order(&self, lines: &[CartLine]) -> Result<OrderId, ApiError> {
        let products: Vec<_> = lines
            .iter()
            .map(|line| {
                json!({
                    "productId": line.product_id,
                    "quantity": line.quantity,
                })
            })
            .collect();

        let data: types::AddOrderData = self
            .execute(
                queries::ADD_ORDER,
                json!({ "input": { "products": products } }),
            )
            .await?;
        Ok(data.orders.add.id)
    }

    /// Patch an order's status, returning the stored status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn patch_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<OrderStatus, ApiError> {
        let data: types::PatchOrderData = self
            .execute(
                queries::UPDATE_ORDER,
                json!({ "patchId": id, "input": { "status": status } }),
            )
            .await?;
        Ok(data.orders.patch.status)
    }

    /// Delete an order record.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete_order(&self, id: &OrderId) -> Result<(), ApiError> {
        let _data: types::RemoveOrderData = self
            .execute(queries::REMOVE_ORDER, json!({ "removeId": id }))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Profile Queries
    // =========================================================================

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let data: types::ProfileData = self
            .execute(queries::GET_PROFILE, serde_json::Value::Null)
            .await?;
        Ok(Profile::from(data.profile))
    }

    /// Fetch just the signed-in user's profile id.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn profile_id(&self) -> Result<ProfileId, ApiError> {
        let data: types::ProfileIdData = self
            .execute(queries::GET_PROFILE_ID, serde_json::Value::Null)
            .await?;
        Ok(data.profile.id)
    }
}

fn products_cache_key(query: &CatalogQuery) -> String {
    format!(
        "products:{}:{}:{:?}",
        query.page_number, query.page_size, query.sort_direction
    )
}

fn products_variables(query: &CatalogQuery) -> serde_json::Value {
    json!({
        "input": {
            "pagination": {
                "pageNumber": query.page_number,
                "pageSize": query.page_size,
            },
            "sorting": {
                "field": "price",
                "direction": query.sort_direction,
            },
        }
    })
}

// =============================================================================
// Gateway Implementations
// =============================================================================

impl CatalogGateway for CatalogClient {
    fn fetch_page(
        &self,
        query: &CatalogQuery,
    ) -> impl Future<Output = Result<ProductPage, ApiError>> + Send {
        self.products_page(query)
    }
}

impl ProductDetailGateway for CatalogClient {
    fn fetch_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send {
        self.product(id)
    }
}

impl OrderGateway for CatalogClient {
    // Method-call syntax resolves to the inherent methods above.
    fn create_order(
        &self,
        lines: &[CartLine],
    ) -> impl Future<Output = Result<OrderId, ApiError>> + Send {
        self.create_order(lines)
    }

    fn patch_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<OrderStatus, ApiError>> + Send {
        self.patch_order_status(id, status)
    }

    fn delete_order(&self, id: &OrderId) -> impl Future<Output = Result<(), ApiError>> + Send {
        self.delete_order(id)
    }

    fn fetch_orders(&self) -> impl Future<Output = Result<Vec<Order>, ApiError>> + Send {
        self.orders()
    }
}
