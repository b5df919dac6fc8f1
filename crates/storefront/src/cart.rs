//! The session's shopping cart.
//!
//! Holds at most one line per product, each with a quantity of at least one.
//! Lines keep the order in which products were first added. Totals are
//! recomputed on every read rather than cached.

use std::num::NonZeroU32;

use emerald_core::{Price, Product, ProductId};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, StorefrontError};

/// One product-and-quantity pairing in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product: Product,
    quantity: NonZeroU32,
}

impl CartLine {
    fn new(product: Product) -> Self {
        Self {
            product,
            quantity: NonZeroU32::MIN,
        }
    }

    /// Units of the product in this line. Always at least one.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity())
    }
}

/// In-memory cart owned by a single session.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of `product`, creating its line if needed.
    ///
    /// Never fails. Returns the line's new quantity. The line keeps the
    /// product snapshot from its first add.
    pub fn add_item(&mut self, product: &Product) -> u32 {
        let quantity = if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
            line.quantity()
        } else {
            self.lines.push(CartLine::new(product.clone()));
            1
        };
        debug!(product_id = %product.id, quantity, "Added item to cart");
        quantity
    }

    /// Set the quantity of an existing line.
    ///
    /// Zero removes the line. Setting a quantity for a product that is not
    /// in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Negative quantities, and quantities above `u32::MAX`, are rejected with
    /// [`StorefrontError::InvalidQuantity`] and leave the cart unchanged.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) -> Result<()> {
        let quantity =
            u32::try_from(quantity).map_err(|_| StorefrontError::InvalidQuantity(quantity))?;

        match NonZeroU32::new(quantity) {
            None => {
                self.remove_item(id);
            }
            Some(quantity) => {
                if let Some(line) = self.line_mut(id) {
                    line.quantity = quantity;
                } else {
                    debug!(product_id = %id, "Quantity update for product not in cart");
                }
            }
        }
        Ok(())
    }

    /// Add one unit to an existing line. No-op if absent.
    pub fn increment(&mut self, id: ProductId) {
        if let Some(line) = self.line_mut(id) {
            line.quantity = line.quantity.saturating_add(1);
        }
    }

    /// Remove one unit from an existing line, dropping the line at zero.
    /// No-op if absent.
    pub fn decrement(&mut self, id: ProductId) {
        let Some(line) = self.line_mut(id) else {
            return;
        };
        match NonZeroU32::new(line.quantity.get() - 1) {
            Some(quantity) => line.quantity = quantity,
            None => {
                self.remove_item(id);
            }
        }
    }

    /// Remove the line for `id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != id);
        before != self.lines.len()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities across all lines (the header badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == id)
    }

    /// Whether the cart has a line for `id`.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Freeze the current lines and total for checkout.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            total: self.total(),
        }
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.product.id == id)
    }
}

/// Cart contents frozen at checkout entry.
///
/// The order summary shown during checkout comes from here, never from the
/// live cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
    total: Price,
}

impl CartSnapshot {
    /// The frozen lines.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The total computed when the snapshot was taken.
    #[must_use]
    pub const fn total(&self) -> Price {
        self.total
    }

    /// Sum of quantities across the frozen lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity())).sum()
    }

    /// Whether the snapshot has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
