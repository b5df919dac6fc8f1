//! Remote data-service commands.

use std::io::Write;

use emerald_storefront::config::StorefrontConfig;
use emerald_storefront::remote::{
    DataAccess, InMemoryDataAccess, OrderRecord, RemoteProduct, RestDataAccess,
};
use tracing::warn;

use super::CommandError;
use crate::RemoteAction;

/// Run a `remote` subcommand against the configured service.
///
/// Without a configured service, runs against in-memory data seeded from the
/// catalog.
///
/// # Errors
///
/// Returns an error if the service call fails or output cannot be written.
pub async fn run(
    config: &StorefrontConfig,
    action: RemoteAction,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    if let Some(remote) = &config.remote {
        let data = RestDataAccess::new(remote)?;
        execute(&data, action, out).await
    } else {
        warn!("No remote data service configured; using in-memory data seeded from the catalog");
        let data = InMemoryDataAccess::from_catalog(&config.load_catalog()?);
        execute(&data, action, out).await
    }
}

async fn execute<D: DataAccess>(
    data: &D,
    action: RemoteAction,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match action {
        RemoteAction::Products { search, category } => {
            let products = match (search, category) {
                (Some(query), _) => data.search_products(&query).await?,
                (None, Some(category)) => data.products_by_category(&category).await?,
                (None, None) => data.list_products().await?,
            };
            for product in &products {
                write_product(out, product)?;
            }
            writeln!(out, "{} products", products.len())?;
        }
        RemoteAction::Orders => {
            let orders = data.list_orders().await?;
            for order in &orders {
                writeln!(
                    out,
                    "{}  {:<10} {:>10}  {} items  {}",
                    order.id,
                    order.status.as_str(),
                    order.total_amount.to_string(),
                    order.order_items.len(),
                    order.created_at.format("%Y-%m-%d %H:%M")
                )?;
            }
            writeln!(out, "{} orders", orders.len())?;
        }
        RemoteAction::Order { id } => {
            let order = data.get_order(id).await?;
            write_order(out, &order)?;
        }
        RemoteAction::SetStatus { id, status } => {
            let order = data.update_order_status(id, status).await?;
            writeln!(out, "Order {} is now {}", order.id, order.status)?;
        }
    }
    Ok(())
}

fn write_product(out: &mut impl Write, product: &RemoteProduct) -> std::io::Result<()> {
    writeln!(
        out,
        "{}  {:<32} {:>10}  {:<12} stock {}",
        product.id,
        product.name,
        product.price.to_string(),
        product.category,
        product.stock
    )
}

fn write_order(out: &mut impl Write, order: &OrderRecord) -> std::io::Result<()> {
    writeln!(out, "Order {}", order.id)?;
    writeln!(out, "Status: {}", order.status)?;
    writeln!(out, "Customer: {}", order.user_id)?;
    writeln!(out, "Placed: {}", order.created_at.to_rfc3339())?;
    writeln!(out, "Ship to: {}", order.shipping_address)?;
    for item in &order.order_items {
        let name = item
            .product
            .as_ref()
            .map_or(item.product_id.as_str(), |p| p.name.as_str());
        writeln!(
            out,
            "  {:>3} x {:<32} {:>10}",
            item.quantity,
            name,
            item.unit_price.times(item.quantity).to_string()
        )?;
    }
    writeln!(out, "Total: {}", order.total_amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emerald_core::{OrderStatus, Price, ProductId};
    use emerald_storefront::catalog::Catalog;
    use emerald_storefront::remote::{NewOrder, NewOrderItem, catalog_uuid};
    use serde_json::json;

    use super::*;

    fn store() -> InMemoryDataAccess {
        InMemoryDataAccess::from_catalog(&Catalog::builtin())
    }

    async fn render(data: &InMemoryDataAccess, action: RemoteAction) -> String {
        let mut out = Vec::new();
        execute(data, action, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_products_by_category() {
        let text = render(
            &store(),
            RemoteAction::Products {
                search: None,
                category: Some("Bags".to_string()),
            },
        )
        .await;
        assert!(text.contains("Premium Backpack"));
        assert!(text.ends_with("2 products\n"));
    }

    #[tokio::test]
    async fn test_order_status_round_trip() {
        let data = store();
        let created = data
            .create_order(&NewOrder {
                user_id: "c-42".to_string(),
                status: OrderStatus::Pending,
                total_amount: Price::from_cents(7998),
                shipping_address: json!({"city": "London"}),
                items: vec![NewOrderItem {
                    product_id: catalog_uuid(ProductId::new(21)).to_string(),
                    quantity: 2,
                    unit_price: Price::from_cents(3999),
                }],
            })
            .await
            .unwrap();

        let text = render(
            &data,
            RemoteAction::SetStatus {
                id: created.id,
                status: OrderStatus::Shipped,
            },
        )
        .await;
        assert_eq!(text, format!("Order {} is now shipped\n", created.id));

        let text = render(&data, RemoteAction::Order { id: created.id }).await;
        assert!(text.contains("Status: shipped"));
        assert!(text.contains("Wireless Charging Pad"));
        assert!(text.contains("Total: $79.98"));

        let text = render(&data, RemoteAction::Orders).await;
        assert!(text.ends_with("1 orders\n"));
    }

    #[tokio::test]
    async fn test_missing_order_is_error() {
        let mut out = Vec::new();
        let result = execute(
            &store(),
            RemoteAction::Order {
                id: uuid::Uuid::new_v4(),
            },
            &mut out,
        )
        .await;
        assert!(matches!(result, Err(CommandError::Remote(_))));
    }
}
