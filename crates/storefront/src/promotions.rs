//! Sale listing.
//!
//! A sale item goes into the cart as a copy of the catalog product carrying
//! the sale price, so the discount flows through to checkout.

use emerald_core::{Price, Product};

use crate::catalog::Catalog;

/// Discount applied when the configuration does not override it.
pub const DEFAULT_SALE_PERCENT: u8 = 30;

/// A product shown on the sale page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleItem<'a> {
    pub product: &'a Product,
    pub sale_price: Price,
}

impl<'a> SaleItem<'a> {
    /// `product` with `percent` off.
    #[must_use]
    pub fn new(product: &'a Product, percent: u8) -> Self {
        Self {
            product,
            sale_price: product.price.discounted(percent),
        }
    }

    /// The product snapshot to put in the cart: the catalog product at its
    /// sale price.
    #[must_use]
    pub fn to_cart_product(&self) -> Product {
        Product {
            price: self.sale_price,
            ..self.product.clone()
        }
    }

    /// The undiscounted catalog price.
    #[must_use]
    pub const fn original_price(&self) -> Price {
        self.product.price
    }
}

/// Every catalog product with `percent` off, rounded to whole currency units.
#[must_use]
pub fn sale_listing(catalog: &Catalog, percent: u8) -> Vec<SaleItem<'_>> {
    catalog
        .products()
        .iter()
        .map(|product| SaleItem::new(product, percent))
        .collect()
}
