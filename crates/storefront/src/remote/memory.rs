//! In-process backend with the same contract as the HTTP one.

use chrono::{DateTime, Utc};
use emerald_core::OrderStatus;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    DataAccess, NewOrder, OrderItem, OrderRecord, RemoteError, RemoteProduct, catalog_uuid,
};
use crate::catalog::Catalog;

/// Stock level given to products seeded from a catalog.
const SEEDED_STOCK: i32 = 25;
/// Seeded products are spaced a day apart starting here (2024-01-01).
const SEED_EPOCH_SECS: i64 = 1_704_067_200;

/// Products and orders held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDataAccess {
    products: RwLock<Vec<RemoteProduct>>,
    orders: RwLock<Vec<OrderRecord>>,
}

impl InMemoryDataAccess {
    #[must_use]
    pub fn new(products: Vec<RemoteProduct>) -> Self {
        Self {
            products: RwLock::new(products),
            orders: RwLock::new(Vec::new()),
        }
    }

    /// Seed with every catalog product.
    ///
    /// Identifiers are derived from catalog ids, and higher ids are newer, so
    /// the newest-first listing matches the catalog's newest-first order.
    #[must_use]
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let products = catalog
            .products()
            .iter()
            .map(|p| {
                let created_at = DateTime::from_timestamp(
                    SEED_EPOCH_SECS + i64::from(p.id.as_i32()) * 86_400,
                    0,
                )
                .unwrap_or_default();
                RemoteProduct {
                    id: catalog_uuid(p.id),
                    name: p.name.clone(),
                    description: Some(p.description.clone()).filter(|d| !d.is_empty()),
                    price: p.price,
                    stock: SEEDED_STOCK,
                    category: p.category.clone(),
                    image_url: Some(p.image.clone()).filter(|i| !i.is_empty()),
                    created_at,
                    updated_at: created_at,
                }
            })
            .collect();
        Self::new(products)
    }

    async fn products_where(&self, keep: impl Fn(&RemoteProduct) -> bool) -> Vec<RemoteProduct> {
        let mut found: Vec<RemoteProduct> = self
            .products
            .read()
            .await
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

impl DataAccess for InMemoryDataAccess {
    async fn list_products(&self) -> Result<Vec<RemoteProduct>, RemoteError> {
        Ok(self.products_where(|_| true).await)
    }

    async fn get_product(&self, id: Uuid) -> Result<RemoteProduct, RemoteError> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("Product not found: {id}")))
    }

    async fn search_products(&self, query: &str) -> Result<Vec<RemoteProduct>, RemoteError> {
        let needle = query.trim();
        Ok(self.products_where(|p| p.mentions(needle)).await)
    }

    async fn products_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<RemoteProduct>, RemoteError> {
        Ok(self.products_where(|p| p.category == category).await)
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>, RemoteError> {
        let mut orders = self.orders.read().await.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    #[instrument(skip(self, order), fields(user_id = %order.user_id))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderRecord, RemoteError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let products = self.products.read().await;
        let order_items = order
            .items
            .iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_id: id,
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                product: products
                    .iter()
                    .find(|p| p.id.to_string() == item.product_id)
                    .cloned(),
            })
            .collect();
        drop(products);

        let record = OrderRecord {
            id,
            user_id: order.user_id.clone(),
            status: order.status,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address.clone(),
            created_at: now,
            updated_at: now,
            order_items,
        };
        self.orders.write().await.push(record.clone());
        debug!(order_id = %id, "Order created");
        Ok(record)
    }

    async fn get_order(&self, id: Uuid) -> Result<OrderRecord, RemoteError> {
        self.orders
            .read()
            .await
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("Order not found: {id}")))
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, RemoteError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| RemoteError::NotFound(format!("Order not found: {id}")))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}
