//! Rows exchanged with the remote data service.

use chrono::{DateTime, Utc};
use emerald_core::{OrderStatus, Price, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::checkout::OrderConfirmation;

/// Row identifier for a catalog product.
///
/// Catalog ids are small integers while the service keys rows by UUID; the
/// integer is used as the UUID's value so both sides agree.
#[must_use]
pub fn catalog_uuid(id: ProductId) -> Uuid {
    Uuid::from_u128(u128::from(id.as_i32().unsigned_abs()))
}

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProduct {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteProduct {
    /// Whether the name or description contains `needle`, ignoring case.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// An order row with its line items embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: String,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// One line of a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Price,
    /// The referenced product, when the service embeds it.
    #[serde(default, rename = "products", skip_serializing_if = "Option::is_none")]
    pub product: Option<RemoteProduct>,
}

/// Order insert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub user_id: String,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: serde_json::Value,
    /// Inserted separately once the order row exists.
    #[serde(skip)]
    pub items: Vec<NewOrderItem>,
}

/// Line item insert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Price,
}

impl NewOrder {
    /// A pending order for a completed checkout.
    #[must_use]
    pub fn from_confirmation(confirmation: &OrderConfirmation, user_id: impl Into<String>) -> Self {
        let shipping = &confirmation.shipping;
        let items = confirmation
            .order
            .lines()
            .iter()
            .map(|line| NewOrderItem {
                product_id: catalog_uuid(line.product.id).to_string(),
                quantity: line.quantity(),
                unit_price: line.product.price,
            })
            .collect();

        Self {
            user_id: user_id.into(),
            status: OrderStatus::Pending,
            total_amount: confirmation.order.total(),
            shipping_address: json!({
                "reference": confirmation.reference,
                "name": shipping.full_name(),
                "email": shipping.email.as_str(),
                "address": shipping.address,
                "city": shipping.city,
                "state": shipping.state,
                "zip_code": shipping.zip_code,
            }),
            items,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderItemInsert<'a> {
    pub order_id: Uuid,
    #[serde(flatten)]
    pub item: &'a NewOrderItem,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row_deserializes() {
        let json = r#"{
            "id": "3f2b8c1e-9a4d-4e6f-8b7a-1c2d3e4f5a6b",
            "name": "Leather Messenger Bag",
            "description": null,
            "price": 159.99,
            "stock": 12,
            "category": "Bags",
            "image_url": null,
            "created_at": "2024-03-01T10:00:00+00:00",
            "updated_at": "2024-03-02T10:00:00+00:00"
        }"#;
        let product: RemoteProduct = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Price::from_cents(15999));
        assert!(product.mentions("MESSENGER"));
        assert!(!product.mentions("wallet"));
    }

    #[test]
    fn test_order_row_with_embedded_items() {
        let json = r#"{
            "id": "0b6f1a2c-3d4e-4f50-8a9b-0c1d2e3f4a5b",
            "user_id": "guest",
            "status": "shipped",
            "total_amount": "79.98",
            "shipping_address": {"city": "London"},
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z",
            "order_items": [{
                "id": "1b6f1a2c-3d4e-4f50-8a9b-0c1d2e3f4a5b",
                "order_id": "0b6f1a2c-3d4e-4f50-8a9b-0c1d2e3f4a5b",
                "product_id": "21",
                "quantity": 2,
                "unit_price": 39.99
            }]
        }"#;
        let order: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_amount, Price::from_cents(7998));
        assert_eq!(order.order_items.len(), 1);
        assert!(order.order_items.first().unwrap().product.is_none());
    }

    #[test]
    fn test_order_item_insert_flattens() {
        let item = NewOrderItem {
            product_id: "21".to_string(),
            quantity: 2,
            unit_price: Price::from_cents(3999),
        };
        let insert = OrderItemInsert {
            order_id: Uuid::nil(),
            item: &item,
        };
        let value = serde_json::to_value(&insert).unwrap();
        assert_eq!(value["product_id"], "21");
        assert_eq!(value["quantity"], 2);
        assert_eq!(value["order_id"], Uuid::nil().to_string());
    }
}
