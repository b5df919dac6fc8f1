//! The static product catalog.
//!
//! The catalog is loaded once per process (either the built-in product list
//! or a JSON file) and is immutable afterwards. Products are kept in
//! ascending id order so every listing derived from it is deterministic.

use std::path::Path;

use emerald_core::{Price, Product, ProductId};
use thiserror::Error;
use tracing::{info, instrument};

/// Errors that can occur when loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Reading the catalog file failed.
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not a JSON array of products.
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two products share an identifier.
    #[error("Duplicate product id: {0}")]
    DuplicateId(ProductId),
}

/// (id, name, price in cents, category, unsplash photo, description)
type BuiltinRow = (i32, &'static str, u32, &'static str, &'static str, &'static str);

const BUILTIN_PRODUCTS: &[BuiltinRow] = &[
    (1, "Premium Wireless Headphones", 29999, "Electronics", "1505740420928-5e560c06d30e",
        "High-quality wireless headphones with active noise cancellation, 30-hour battery life, and premium audio drivers"),
    (2, "Minimalist Watch", 19999, "Accessories", "1523275335684-37898b6baf30",
        "Elegant minimalist watch with genuine leather strap and sapphire crystal glass"),
    (3, "Smart Fitness Tracker", 14999, "Electronics", "1575311373937-040b8e1fd5b6",
        "Advanced fitness tracking with heart rate monitoring, sleep analysis, and 20+ sport modes"),
    (4, "Designer Sunglasses", 15999, "Accessories", "1572635196237-14b3f281503f",
        "UV protection with polarized lenses and premium Italian design"),
    (5, "Leather Weekend Bag", 29999, "Bags", "1553062407-98eeb64c6a62",
        "Handcrafted full-grain leather duffle bag with waterproof lining"),
    (6, "Smart Home Speaker", 19999, "Electronics", "1589492477829-5e65395b66cc",
        "360° sound with voice control and multi-room synchronization"),
    (7, "Premium Coffee Maker", 24999, "Home", "1495474472287-4d71bcdd2085",
        "Professional-grade coffee maker with precision brewing control"),
    (8, "Wireless Earbuds", 17999, "Electronics", "1590658268037-6bf12165a8df",
        "True wireless earbuds with active noise cancellation and wireless charging"),
    (9, "Leather Wallet", 8999, "Accessories", "1627123424574-724758594e93",
        "Slim RFID-blocking wallet made from premium Italian leather"),
    (10, "Smart Watch", 39999, "Electronics", "1579586337278-3befd40fd17a",
        "Advanced smartwatch with health monitoring and cellular connectivity"),
    (11, "Premium Camera Lens", 89999, "Photography", "1617005082133-548c4dd27f35",
        "Professional-grade camera lens with superior optical performance"),
    (12, "Mechanical Keyboard", 15999, "Electronics", "1601445638532-3c6f6c3aa1d6",
        "Premium mechanical keyboard with RGB backlighting and hot-swappable switches"),
    (13, "Gaming Mouse", 7999, "Gaming", "1615663245857-ac93bb7c39e7",
        "High-precision gaming mouse with customizable weights and RGB lighting"),
    (15, "Vintage Film Camera", 29999, "Photography", "1495707902641-75cac588d2e9",
        "Restored vintage film camera with leather case"),
    (17, "Minimalist Desk Setup", 39999, "Office", "1593062096033-9a26b09da705",
        "Complete minimalist desk setup with wireless charging"),
    (18, "Professional Microphone", 24999, "Audio", "1590602847861-f357a9332bbc",
        "Studio-quality USB microphone for podcasting and recording"),
    (20, "Air Purifier", 19999, "Home", "1585771724684-38269d6639fd",
        "Smart air purifier with HEPA filter and air quality monitoring"),
    (21, "Wireless Charging Pad", 3999, "Electronics", "1622445275463-afa2ab738c34",
        "Fast wireless charging pad with LED indicator"),
    (22, "Premium Backpack", 12999, "Bags", "1553062407-98eeb64c6a62",
        "Water-resistant laptop backpack with anti-theft features"),
    (25, "Smart Light Bulbs Set", 7999, "Home", "1565849904461-04a58ad377e0",
        "Set of 4 smart LED bulbs with voice control and scheduling"),
    (26, "Desk Plant Set", 4999, "Home", "1485955900006-10f4d324d411",
        "Set of 3 low-maintenance desk plants in modern planters"),
    (27, "Premium Fountain Pen", 12999, "Office", "1579723985163-28f30af7093b",
        "Luxury fountain pen with fine nib and gift box"),
    (28, "Noise-Cancelling Headphones", 34999, "Electronics", "1578319439584-104c94d37305",
        "Premium noise-cancelling headphones with 40-hour battery life"),
    (30, "Minimalist Wall Clock", 5999, "Home", "1563861826100-9cb868fdbe1c",
        "Silent wall clock with Scandinavian design"),
];

fn unsplash_url(photo: &str) -> String {
    format!("https://images.unsplash.com/photo-{photo}?w=800&auto=format&fit=crop&q=60")
}

/// An immutable, id-ordered list of products.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// The built-in catalog shipped with the storefront.
    #[must_use]
    pub fn builtin() -> Self {
        let products = BUILTIN_PRODUCTS
            .iter()
            .map(|&(id, name, cents, category, photo, description)| Product {
                id: ProductId::new(id),
                name: name.to_string(),
                price: Price::from_cents(cents),
                description: description.to_string(),
                image: unsplash_url(photo),
                category: category.to_string(),
            })
            .collect();
        Self { products }
    }

    /// Build a catalog from arbitrary products, sorting them by id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two products share an id.
    pub fn from_products(mut products: Vec<Product>) -> Result<Self, CatalogError> {
        products.sort_by_key(|p| p.id);
        let duplicate = products.windows(2).find_map(|pair| match pair {
            [a, b] if a.id == b.id => Some(a.id),
            _ => None,
        });
        if let Some(id) = duplicate {
            return Err(CatalogError::DuplicateId(id));
        }
        Ok(Self { products })
    }

    /// Parse a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a price is negative, or ids repeat.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails [`Catalog::from_json`].
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        info!(products = catalog.len(), "Catalog loaded from file");
        Ok(catalog)
    }

    /// All products in ascending id order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .and_then(|idx| self.products.get(idx))
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct category labels in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for product in &self.products {
            if !seen.contains(&product.category.as_str()) {
                seen.push(&product.category);
            }
        }
        seen
    }

    /// Products grouped under their category, categories in first-appearance order.
    #[must_use]
    pub fn grouped_by_category(&self) -> Vec<(&str, Vec<&Product>)> {
        self.categories()
            .into_iter()
            .map(|category| {
                let members = self
                    .products
                    .iter()
                    .filter(|p| p.category == category)
                    .collect();
                (category, members)
            })
            .collect()
    }

    /// The leading `limit` entries of the catalog listing.
    #[must_use]
    pub fn new_arrivals(&self, limit: usize) -> &[Product] {
        self.products.split_at(limit.min(self.products.len())).0
    }
}
