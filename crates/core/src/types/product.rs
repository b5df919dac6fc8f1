//! The catalog's product record.

use serde::{Deserialize, Serialize};

use crate::{Price, ProductId};

/// A purchasable product.
///
/// Products are created once when the catalog loads and are never mutated
/// afterwards; carts and checkouts hold clones as snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    /// Image URL or asset path.
    pub image: String,
    /// Category label, compared by exact match.
    pub category: String,
}

impl Product {
    /// Case-insensitive substring match against name or description.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}
