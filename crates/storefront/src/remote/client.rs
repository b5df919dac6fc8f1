//! PostgREST-style HTTP backend.
//!
//! Tables live under `{base}/rest/v1/`. Requests carry the API key as both the
//! `apikey` header and a bearer token. Product reads (except searches) are
//! cached; order reads always hit the service.

use std::sync::Arc;

use emerald_core::OrderStatus;
use moka::future::Cache;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use super::types::{OrderItemInsert, StatusUpdate};
use super::{DataAccess, NewOrder, OrderItem, OrderRecord, RemoteError, RemoteProduct};
use crate::config::RemoteConfig;

const REST_PATH: &str = "rest/v1/";
const ORDER_SELECT: &str = "*,order_items(*,products(*))";
const NEWEST_FIRST: &str = "created_at.desc";

#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<RemoteProduct>),
    Products(Vec<RemoteProduct>),
}

/// Client for a PostgREST-style data service.
///
/// Product listings and lookups are cached for the configured TTL.
#[derive(Clone)]
pub struct RestDataAccess {
    inner: Arc<RestDataAccessInner>,
}

struct RestDataAccessInner {
    client: reqwest::Client,
    rest_base: Url,
    cache: Cache<String, CacheValue>,
}

impl RestDataAccess {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Config` if the key cannot be sent as a header or
    /// the URL cannot hold a path, and `RemoteError::Http` if the HTTP client
    /// fails to build.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let key = config.api_key.expose_secret();
        let mut headers = HeaderMap::new();

        let mut apikey = HeaderValue::from_str(key)
            .map_err(|e| RemoteError::Config(format!("Invalid API key format: {e}")))?;
        apikey.set_sensitive(true);
        headers.insert("apikey", apikey);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| RemoteError::Config(format!("Invalid API key format: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(RestDataAccessInner {
                client,
                rest_base: rest_base(&config.url)?,
                cache,
            }),
        })
    }

    fn table_url(&self, table: &str, query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let mut url = self
            .inner
            .rest_base
            .join(table)
            .map_err(|e| RemoteError::Config(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let response = self.inner.client.get(url).send().await?;
        handle_response(response).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self
            .inner
            .client
            .request(method, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        handle_response(response).await
    }

    async fn cached_products(
        &self,
        cache_key: String,
        url: Url,
    ) -> Result<Vec<RemoteProduct>, RemoteError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<RemoteProduct> = self.get(url).await?;
        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }
}

impl DataAccess for RestDataAccess {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<RemoteProduct>, RemoteError> {
        let url = self.table_url("products", &[("select", "*"), ("order", NEWEST_FIRST)])?;
        self.cached_products("products".to_string(), url).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: Uuid) -> Result<RemoteProduct, RemoteError> {
        let cache_key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let filter = format!("eq.{id}");
        let url = self.table_url("products", &[("select", "*"), ("id", &filter)])?;
        let rows: Vec<RemoteProduct> = self.get(url).await?;
        let product = single(rows, || format!("Product not found: {id}"))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn search_products(&self, query: &str) -> Result<Vec<RemoteProduct>, RemoteError> {
        let filter = search_filter(query);
        let url = self.table_url(
            "products",
            &[("select", "*"), ("or", &filter), ("order", NEWEST_FIRST)],
        )?;
        self.get(url).await
    }

    #[instrument(skip(self))]
    async fn products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<RemoteProduct>, RemoteError> {
        let filter = format!("eq.{category}");
        let url = self.table_url(
            "products",
            &[("select", "*"), ("category", &filter), ("order", NEWEST_FIRST)],
        )?;
        self.cached_products(format!("category:{category}"), url).await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<OrderRecord>, RemoteError> {
        let url = self.table_url("orders", &[("select", ORDER_SELECT), ("order", NEWEST_FIRST)])?;
        self.get(url).await
    }

    #[instrument(skip(self, order), fields(user_id = %order.user_id, items = order.items.len()))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderRecord, RemoteError> {
        let url = self.table_url("orders", &[])?;
        let rows: Vec<OrderRecord> = self.send(Method::POST, url, order).await?;
        let mut record = single(rows, || "Inserted order was not returned".to_string())?;

        if !order.items.is_empty() {
            let inserts: Vec<OrderItemInsert<'_>> = order
                .items
                .iter()
                .map(|item| OrderItemInsert {
                    order_id: record.id,
                    item,
                })
                .collect();
            let url = self.table_url("order_items", &[])?;
            let items: Vec<OrderItem> = self.send(Method::POST, url, &inserts).await?;
            record.order_items = items;
        }

        debug!(order_id = %record.id, "Order created");
        Ok(record)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: Uuid) -> Result<OrderRecord, RemoteError> {
        let filter = format!("eq.{id}");
        let url = self.table_url("orders", &[("select", ORDER_SELECT), ("id", &filter)])?;
        let rows: Vec<OrderRecord> = self.get(url).await?;
        single(rows, || format!("Order not found: {id}"))
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, RemoteError> {
        let filter = format!("eq.{id}");
        let url = self.table_url("orders", &[("select", ORDER_SELECT), ("id", &filter)])?;
        let rows: Vec<OrderRecord> = self
            .send(Method::PATCH, url, &StatusUpdate { status })
            .await?;
        single(rows, || format!("Order not found: {id}"))
    }
}

impl std::fmt::Debug for RestDataAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDataAccess")
            .field("rest_base", &self.inner.rest_base.as_str())
            .finish_non_exhaustive()
    }
}

/// `{base}/rest/v1/`, keeping any path already on the base URL.
fn rest_base(base: &Url) -> Result<Url, RemoteError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(REST_PATH)
        .map_err(|e| RemoteError::Config(e.to_string()))
}

/// `or` filter matching `query` in name or description, case-insensitively.
///
/// The pattern is double-quoted so commas and parentheses in the query are
/// taken literally.
fn search_filter(query: &str) -> String {
    let escaped = query.trim().replace('\\', "\\\\").replace('"', "\\\"");
    format!("(name.ilike.\"*{escaped}*\",description.ilike.\"*{escaped}*\")")
}

fn single<T>(rows: Vec<T>, missing: impl FnOnce() -> String) -> Result<T, RemoteError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| RemoteError::NotFound(missing()))
}

/// Handle API response and parse JSON.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, RemoteError> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        return serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse data service response"
            );
            RemoteError::Parse(e)
        });
    }

    Err(parse_error(response).await)
}

/// Map an error response to a `RemoteError`.
async fn parse_error(response: reqwest::Response) -> RemoteError {
    let status = response.status();

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            RemoteError::RateLimited(retry_after)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized,
        StatusCode::NOT_FOUND => RemoteError::NotFound("Resource not found".to_string()),
        _ => {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                body = %message.chars().take(500).collect::<String>(),
                "Data service returned non-success status"
            );
            RemoteError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}
