//! A single shopper's session.
//!
//! Everything the shopper mutates is owned here and changed one operation at
//! a time. The catalog is shared read-only.

use std::sync::Arc;

use emerald_core::{Product, ProductId};
use tracing::{info, instrument, warn};

use crate::cart::{CartSnapshot, CartStore};
use crate::catalog::Catalog;
use crate::checkout::{
    CheckoutMachine, CheckoutStep, OrderConfirmation, PaymentForm, ShippingForm,
};
use crate::error::{Result, StorefrontError, add_breadcrumb};
use crate::filter::{self, FilterSpec, SortKey};
use crate::identity::{Customer, Guest, IdentityProvider};
use crate::promotions::SaleItem;
use crate::wishlist::WishlistStore;

/// Cart, wishlist and checkout state for one shopper.
pub struct Session {
    catalog: Arc<Catalog>,
    cart: CartStore,
    wishlist: WishlistStore,
    checkout: Option<CheckoutMachine>,
    identity: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("catalog_len", &self.catalog.len())
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .field("checkout", &self.checkout)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A guest session over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_identity(catalog, Arc::new(Guest))
    }

    #[must_use]
    pub fn with_identity(catalog: Arc<Catalog>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            catalog,
            cart: CartStore::new(),
            wishlist: WishlistStore::new(),
            checkout: None,
            identity,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistStore {
        &self.wishlist
    }

    /// The active checkout, if one has been started.
    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutMachine> {
        self.checkout.as_ref()
    }

    /// The signed-in customer, if any.
    #[must_use]
    pub fn customer(&self) -> Option<Customer> {
        self.identity.current_customer()
    }

    /// Filtered and sorted view of the catalog.
    #[must_use]
    pub fn browse(&self, spec: &FilterSpec, sort: SortKey) -> Vec<&Product> {
        filter::apply(self.catalog.products(), spec, sort)
    }

    /// Add one unit of a catalog product. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the catalog.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn add_to_cart(&mut self, id: ProductId) -> Result<u32> {
        let product = self.catalog.get(id).ok_or_else(|| {
            warn!("Add to cart rejected: unknown product");
            StorefrontError::NotFound(format!("product {id}"))
        })?;
        let quantity = self.cart.add_item(product);

        let id_str = id.to_string();
        add_breadcrumb("cart", "Added item", Some(&[("product_id", &id_str)]));
        Ok(quantity)
    }

    /// Add one unit of a product at its sale price, `percent` off the catalog
    /// price. Returns the line's new quantity.
    ///
    /// A line keeps the price of its first add, so a product already in the
    /// cart at full price stays at full price.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the catalog.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn add_sale_item(&mut self, id: ProductId, percent: u8) -> Result<u32> {
        let product = self.catalog.get(id).ok_or_else(|| {
            warn!("Add sale item rejected: unknown product");
            StorefrontError::NotFound(format!("product {id}"))
        })?;
        let quantity = self
            .cart
            .add_item(&SaleItem::new(product, percent).to_cart_product());

        let id_str = id.to_string();
        let percent_str = percent.to_string();
        add_breadcrumb(
            "cart",
            "Added sale item",
            Some(&[("product_id", &id_str), ("percent_off", &percent_str)]),
        );
        Ok(quantity)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for negative or oversized quantities.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> Result<()> {
        self.cart.set_quantity(id, quantity)?;

        let id_str = id.to_string();
        let quantity_str = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Updated quantity",
            Some(&[("product_id", &id_str), ("quantity", &quantity_str)]),
        );
        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_from_cart(&mut self, id: ProductId) -> bool {
        let removed = self.cart.remove_item(id);
        if removed {
            let id_str = id.to_string();
            add_breadcrumb("cart", "Removed item", Some(&[("product_id", &id_str)]));
        }
        removed
    }

    /// Flip wishlist membership. Returns `true` if the product is now wishlisted.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn toggle_wishlist(&mut self, id: ProductId) -> bool {
        let now_member = self.wishlist.toggle(id);
        let id_str = id.to_string();
        let message = if now_member {
            "Added to wishlist"
        } else {
            "Removed from wishlist"
        };
        add_breadcrumb("wishlist", message, Some(&[("product_id", &id_str)]));
        now_member
    }

    /// Wishlisted products, in catalog order.
    #[must_use]
    pub fn wishlist_products(&self) -> Vec<&Product> {
        self.wishlist.products(&self.catalog)
    }

    /// Start checkout with a frozen copy of the cart.
    ///
    /// Starting again while a checkout is on the shipping or payment step
    /// replaces it with a fresh snapshot of the cart. Returns the shipping
    /// form, prefilled when a customer is signed in.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the cart is empty, or if the active checkout
    /// is confirmed and has not been finished. The active checkout is kept in
    /// both cases.
    #[instrument(skip(self))]
    pub fn begin_checkout(&mut self) -> Result<ShippingForm> {
        let confirmed = self
            .checkout
            .as_ref()
            .and_then(CheckoutMachine::confirmation);
        if let Some(confirmation) = confirmed {
            warn!(
                reference = %confirmation.reference,
                "Checkout restart rejected: order confirmed"
            );
            return Err(StorefrontError::InvalidState(format!(
                "order {} is confirmed; finish the checkout before starting another",
                confirmation.reference
            )));
        }

        let machine = CheckoutMachine::begin(self.cart.snapshot())?;
        let summary = machine.order_summary();
        info!(
            total = %summary.total(),
            items = summary.item_count(),
            "Checkout started"
        );
        self.checkout = Some(machine);
        add_breadcrumb("checkout", "Started checkout", None);

        Ok(self
            .customer()
            .map_or_else(ShippingForm::default, |c| ShippingForm::prefilled_for(&c)))
    }

    fn active_checkout(&mut self) -> Result<&mut CheckoutMachine> {
        self.checkout
            .as_mut()
            .ok_or_else(|| StorefrontError::InvalidState("no checkout in progress".to_string()))
    }

    /// The frozen order summary of the active checkout.
    #[must_use]
    pub fn order_summary(&self) -> Option<&CartSnapshot> {
        self.checkout.as_ref().map(CheckoutMachine::order_summary)
    }

    /// # Errors
    ///
    /// Returns `InvalidState` without an active checkout on the shipping step,
    /// and `Validation` for bad form input.
    #[instrument(skip_all)]
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<()> {
        self.active_checkout()?.submit_shipping(form)?;
        add_breadcrumb("checkout", "Submitted shipping", None);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `InvalidState` without an active checkout on the payment step,
    /// and `Validation` for bad form input.
    #[instrument(skip_all)]
    pub fn submit_payment(&mut self, form: &PaymentForm) -> Result<OrderConfirmation> {
        let confirmation = self.active_checkout()?.submit_payment(form)?;
        let reference = confirmation.reference.to_string();
        add_breadcrumb(
            "checkout",
            "Order confirmed",
            Some(&[("reference", &reference)]),
        );
        Ok(confirmation)
    }

    /// Leave the confirmation page: discard the checkout and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the active checkout is confirmed.
    #[instrument(skip(self))]
    pub fn finish_checkout(&mut self) -> Result<OrderConfirmation> {
        let machine = self.active_checkout()?;
        let Some(confirmation) = machine.confirmation().cloned() else {
            let step = machine.step();
            warn!(%step, "Finish rejected: checkout not confirmed");
            return Err(StorefrontError::InvalidState(format!(
                "checkout is at the {step} step, not {}",
                CheckoutStep::Confirmation
            )));
        };

        self.checkout = None;
        self.cart.clear();
        add_breadcrumb("checkout", "Finished checkout", None);
        Ok(confirmation)
    }

    /// Discard the active checkout, leaving the cart as it is.
    ///
    /// Returns whether there was a checkout to discard.
    #[instrument(skip(self))]
    pub fn abandon_checkout(&mut self) -> bool {
        let abandoned = self.checkout.take().is_some();
        if abandoned {
            add_breadcrumb("checkout", "Abandoned checkout", None);
        }
        abandoned
    }
}
