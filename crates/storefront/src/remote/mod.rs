//! Remote data-access collaborator.
//!
//! The shopping session never calls this layer itself. It sits at the
//! boundary: a presentation layer may list remote products or persist a
//! confirmed order through it, awaiting each call on its own.
//!
//! # Backends
//!
//! - [`RestDataAccess`]: PostgREST-style HTTP API (e.g. Supabase), with
//!   product reads cached via `moka`
//! - [`InMemoryDataAccess`]: process-local tables for tests and offline use
//!
//! All listings are newest first.

mod client;
mod memory;
mod types;

pub use client::RestDataAccess;
pub use memory::InMemoryDataAccess;
pub use types::{
    NewOrder, NewOrderItem, OrderItem, OrderRecord, RemoteProduct, catalog_uuid,
};

use std::future::Future;

use emerald_core::OrderStatus;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when talking to the data service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Unauthorized (invalid API key).
    #[error("Unauthorized: invalid API key")]
    Unauthorized,

    /// The client could not be configured.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Read and write access to remote products and orders.
pub trait DataAccess: Send + Sync {
    /// Every product, newest first.
    fn list_products(&self) -> impl Future<Output = Result<Vec<RemoteProduct>, RemoteError>> + Send;

    /// A single product.
    fn get_product(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<RemoteProduct, RemoteError>> + Send;

    /// Products whose name or description contains `query`, ignoring case.
    fn search_products(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<RemoteProduct>, RemoteError>> + Send;

    /// Products in exactly `category`.
    fn products_by_category(
        &self,
        category: &str,
    ) -> impl Future<Output = Result<Vec<RemoteProduct>, RemoteError>> + Send;

    /// Every order with its items, newest first.
    fn list_orders(&self) -> impl Future<Output = Result<Vec<OrderRecord>, RemoteError>> + Send;

    /// Insert an order and its items.
    fn create_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<OrderRecord, RemoteError>> + Send;

    /// A single order with its items.
    fn get_order(&self, id: Uuid) -> impl Future<Output = Result<OrderRecord, RemoteError>> + Send;

    /// Change an order's status.
    fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> impl Future<Output = Result<OrderRecord, RemoteError>> + Send;
}
