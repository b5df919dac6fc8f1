//! Integration tests for Emerald Market.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emerald-integration-tests
//!
//! # Include tests against a live data service
//! EMERALD_REMOTE_URL=... EMERALD_REMOTE_API_KEY=... \
//!     cargo test -p emerald-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_session` - Cart, wishlist and checkout through a [`Session`]
//! - `remote_data_access` - Storing confirmed orders on a data service

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use emerald_core::{Email, ProductId};
use emerald_storefront::Session;
use emerald_storefront::catalog::{Catalog, CatalogError};
use emerald_storefront::checkout::{PaymentForm, ShippingForm};
use emerald_storefront::identity::{Customer, FixedIdentity};

/// Three products priced 10.00, 30.00 and 5.50.
pub const SMALL_CATALOG: &str = r#"[
    {"id": 1, "name": "Mug", "price": 10.00, "description": "Stoneware mug",
     "image": "mug.jpg", "category": "Home"},
    {"id": 2, "name": "Lamp", "price": 30.00, "description": "Desk lamp with warm light",
     "image": "lamp.jpg", "category": "Home"},
    {"id": 3, "name": "Sticker", "price": 5.50, "description": "Vinyl sticker",
     "image": "sticker.jpg", "category": "Stationery"}
]"#;

/// Parse [`SMALL_CATALOG`].
///
/// # Errors
///
/// Returns an error if the fixture does not parse.
pub fn small_catalog() -> Result<Arc<Catalog>, CatalogError> {
    Catalog::from_json(SMALL_CATALOG).map(Arc::new)
}

/// Guest session over the built-in catalog.
#[must_use]
pub fn builtin_session() -> Session {
    Session::new(Arc::new(Catalog::builtin()))
}

/// Session signed in as `c-7`, "Grace Hopper".
///
/// # Errors
///
/// Returns an error if the fixture email does not parse.
pub fn signed_in_session(catalog: Arc<Catalog>) -> Result<Session, emerald_core::EmailError> {
    let customer = Customer {
        id: "c-7".to_string(),
        email: Email::parse("grace@example.com")?,
        name: "Grace Hopper".to_string(),
    };
    Ok(Session::with_identity(
        catalog,
        Arc::new(FixedIdentity::new(customer)),
    ))
}

/// A shipping form with every field filled in.
#[must_use]
pub fn complete_shipping() -> ShippingForm {
    ShippingForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        address: "12 Analytical Way".to_string(),
        city: "London".to_string(),
        state: "LDN".to_string(),
        zip_code: "10001".to_string(),
    }
}

/// A card that passes format checks.
#[must_use]
pub fn valid_payment() -> PaymentForm {
    PaymentForm::new("4242 4242 4242 4242", "12/27", "123")
}

/// Shorthand for catalog ids.
#[must_use]
pub const fn pid(id: i32) -> ProductId {
    ProductId::new(id)
}
