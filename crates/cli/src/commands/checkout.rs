//! Scripted checkout from a YAML order file.
//!
//! ```yaml
//! customer:            # optional; prefills shipping name and email
//!   id: c-42
//!   email: ada@example.com
//!   name: Ada Lovelace
//! items:               # catalog price; repeated products add up
//!   - product_id: 21
//!     quantity: 2
//!   - product_id: 3
//! sale:                # optional; sale price, `EMERALD_SALE_PERCENT` off
//!   - product_id: 11
//! shipping:
//!   address: 12 Analytical Way
//!   city: London
//!   state: LDN
//!   zip_code: "10001"
//! payment:
//!   card_number: 4242 4242 4242 4242
//!   expiry: 12/27
//!   cvv: "123"
//! ```

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use emerald_core::ProductId;
use emerald_storefront::{Session, StorefrontError};
use emerald_storefront::catalog::Catalog;
use emerald_storefront::checkout::{OrderConfirmation, PaymentForm, ShippingForm};
use emerald_storefront::config::StorefrontConfig;
use emerald_storefront::identity::{Customer, FixedIdentity, Guest, IdentityProvider};
use emerald_storefront::remote::{DataAccess, NewOrder, RestDataAccess};
use serde::Deserialize;
use tracing::{info, instrument};

use super::CommandError;

/// An order file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderFile {
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    /// Lines bought at the sale price.
    #[serde(default)]
    pub sale: Vec<OrderLine>,
    #[serde(default)]
    pub shipping: ShippingForm,
    pub payment: PaymentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentDetails {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckoutOptions {
    /// Store the order on the remote data service.
    pub submit: bool,
    /// Print JSON instead of a text receipt.
    pub json: bool,
}

/// Fields from the file win over prefilled ones, unless left blank.
fn merge_shipping(prefilled: ShippingForm, file: ShippingForm) -> ShippingForm {
    let pick = |file: String, prefilled: String| {
        if file.trim().is_empty() { prefilled } else { file }
    };
    ShippingForm {
        first_name: pick(file.first_name, prefilled.first_name),
        last_name: pick(file.last_name, prefilled.last_name),
        email: pick(file.email, prefilled.email),
        address: pick(file.address, prefilled.address),
        city: pick(file.city, prefilled.city),
        state: pick(file.state, prefilled.state),
        zip_code: pick(file.zip_code, prefilled.zip_code),
    }
}

/// Total quantity per product, in order of first mention.
fn merge_lines(lines: &[OrderLine]) -> Result<Vec<(ProductId, i64)>, StorefrontError> {
    let mut merged: Vec<(ProductId, i64)> = Vec::new();
    for line in lines {
        if line.quantity < 0 {
            return Err(StorefrontError::InvalidQuantity(line.quantity));
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(line.quantity),
            None => merged.push((line.product_id, line.quantity)),
        }
    }
    Ok(merged)
}

/// Drive a session through a whole checkout.
///
/// Sale lines are priced `sale_percent` off the catalog price.
///
/// # Errors
///
/// Returns `DuplicateProduct` if a product is listed under both `items` and
/// `sale`, otherwise the first rejected session operation.
pub fn place_order(
    catalog: Arc<Catalog>,
    order: OrderFile,
    sale_percent: u8,
) -> Result<OrderConfirmation, CommandError> {
    let items = merge_lines(&order.items)?;
    let sale = merge_lines(&order.sale)?;
    let in_both = sale
        .iter()
        .find(|(id, _)| items.iter().any(|(item, _)| item == id));
    if let Some(&(id, _)) = in_both {
        return Err(CommandError::DuplicateProduct(id));
    }

    let identity: Arc<dyn IdentityProvider> = match order.customer {
        Some(customer) => Arc::new(FixedIdentity::new(customer)),
        None => Arc::new(Guest),
    };
    let mut session = Session::with_identity(catalog, identity);

    for &(id, quantity) in &items {
        if i64::from(session.add_to_cart(id)?) != quantity {
            session.set_quantity(id, quantity)?;
        }
    }
    for &(id, quantity) in &sale {
        if i64::from(session.add_sale_item(id, sale_percent)?) != quantity {
            session.set_quantity(id, quantity)?;
        }
    }

    let prefilled = session.begin_checkout()?;
    session.submit_shipping(&merge_shipping(prefilled, order.shipping))?;

    let payment = PaymentForm::new(
        order.payment.card_number,
        order.payment.expiry,
        order.payment.cvv,
    );
    session.submit_payment(&payment)?;
    Ok(session.finish_checkout()?)
}

fn write_receipt(
    confirmation: &OrderConfirmation,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    writeln!(out, "Order confirmed: {}", confirmation.reference)?;
    writeln!(out, "Placed: {}", confirmation.placed_at.to_rfc3339())?;
    for line in confirmation.order.lines() {
        writeln!(
            out,
            "  {:>3} x {:<32} {:>10}",
            line.quantity(),
            line.product.name,
            line.line_total().to_string()
        )?;
    }
    writeln!(out, "Total: {}", confirmation.order.total())?;

    let shipping = &confirmation.shipping;
    writeln!(
        out,
        "Ship to: {}, {}, {}, {} {}",
        shipping.full_name(),
        shipping.address,
        shipping.city,
        shipping.state,
        shipping.zip_code
    )?;
    writeln!(out, "Paid with: {}", confirmation.payment)?;
    Ok(())
}

/// Run the `checkout` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a checkout step is
/// rejected, or the remote store fails.
#[instrument(skip(config, path, options, out), fields(path = %path.display()))]
pub async fn run(
    config: &StorefrontConfig,
    path: &Path,
    options: CheckoutOptions,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    // Fail before placing anything if the order cannot be stored.
    let remote = if options.submit {
        let remote = config.remote.as_ref().ok_or(CommandError::NoRemote)?;
        Some(RestDataAccess::new(remote)?)
    } else {
        None
    };

    let text = tokio::fs::read_to_string(path).await?;
    let order: OrderFile = serde_yaml::from_str(&text)?;
    let user_id = order
        .customer
        .as_ref()
        .map_or_else(|| "guest".to_string(), |c| c.id.clone());

    let catalog = Arc::new(config.load_catalog()?);
    let confirmation = place_order(catalog, order, config.sale_percent)?;

    let stored = match remote {
        Some(remote) => {
            let record = remote
                .create_order(&NewOrder::from_confirmation(&confirmation, user_id))
                .await?;
            info!(order_id = %record.id, "Order stored remotely");
            Some(record)
        }
        None => None,
    };

    if options.json {
        serde_json::to_writer_pretty(&mut *out, &confirmation)?;
        writeln!(out)?;
    } else {
        write_receipt(&confirmation, out)?;
        if let Some(record) = stored {
            writeln!(out, "Stored as order {} ({})", record.id, record.status)?;
        }
    }
    Ok(())
}
