//! Wishlist: a set of product ids with toggle semantics.

use std::collections::HashSet;

use emerald_core::{Product, ProductId};

use crate::catalog::Catalog;

/// In-memory wishlist owned by a single session.
#[derive(Debug, Clone, Default)]
pub struct WishlistStore {
    ids: HashSet<ProductId>,
}

impl WishlistStore {
    /// Create an empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns the new membership.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Member ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Wishlisted products in catalog order. Ids missing from the catalog are skipped.
    #[must_use]
    pub fn products<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        catalog
            .products()
            .iter()
            .filter(|p| self.ids.contains(&p.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_is_an_involution() {
        let mut wishlist = WishlistStore::new();
        wishlist.toggle(ProductId::new(3));
        let before = wishlist.ids();

        assert!(wishlist.toggle(ProductId::new(5)));
        assert!(!wishlist.toggle(ProductId::new(5)));
        assert_eq!(wishlist.ids(), before);

        assert!(!wishlist.toggle(ProductId::new(3)));
        assert!(wishlist.toggle(ProductId::new(3)));
        assert_eq!(wishlist.ids(), before);
    }

    #[test]
    fn test_contains() {
        let mut wishlist = WishlistStore::new();
        assert!(!wishlist.contains(ProductId::new(1)));
        wishlist.toggle(ProductId::new(1));
        assert!(wishlist.contains(ProductId::new(1)));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_products_follow_catalog_order_and_skip_unknown() {
        let catalog = Catalog::builtin();
        let mut wishlist = WishlistStore::new();
        wishlist.toggle(ProductId::new(10));
        wishlist.toggle(ProductId::new(2));
        wishlist.toggle(ProductId::new(14)); // not in the catalog

        let ids: Vec<i32> = wishlist
            .products(&catalog)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 10]);
        assert_eq!(wishlist.len(), 3);
    }
}
