//! Product filtering and sorting.
//!
//! [`apply`] is a pure function over a product slice: it filters first, then
//! sorts, and returns borrowed products. Calling it twice with the same
//! inputs yields the same sequence.

use std::fmt;
use std::str::FromStr;

use emerald_core::{Price, Product};
use url::form_urlencoded;

/// Optional constraints used to derive a product subset.
///
/// Every field is optional; `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Case-insensitive substring of the name or description.
    pub query: Option<String>,
    /// Exact category label.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Price>,
    /// Inclusive upper price bound.
    pub max_price: Option<Price>,
}

impl FilterSpec {
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn with_price_range(mut self, min: Option<Price>, max: Option<Price>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    fn trimmed_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// The lowercased search needle, or `None` if the query is blank.
    fn needle(&self) -> Option<String> {
        self.trimmed_query().map(str::to_lowercase)
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    /// Whether the price bounds exclude every possible price.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        matches!((self.min_price, self.max_price), (Some(min), Some(max)) if min > max)
    }

    fn admits(&self, product: &Product, needle: Option<&str>) -> bool {
        needle.is_none_or(|needle| product.mentions(needle))
            && self.category().is_none_or(|c| product.category == c)
            && self.min_price.is_none_or(|min| product.price >= min)
            && self.max_price.is_none_or(|max| product.price <= max)
    }

    /// Parse the search page's query string (`q`, `category`, `minPrice`, `maxPrice`).
    ///
    /// Unknown keys and unparseable prices are ignored. A leading `?` is allowed.
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut spec = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "q" => spec.query = Some(value.into_owned()),
                "category" => spec.category = Some(value.into_owned()),
                "minPrice" => spec.min_price = value.parse().ok(),
                "maxPrice" => spec.max_price = value.parse().ok(),
                _ => {}
            }
        }
        spec
    }

    /// Encode the set constraints as a query string, omitting absent ones.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(query) = self.trimmed_query() {
            serializer.append_pair("q", query);
        }
        if let Some(category) = self.category() {
            serializer.append_pair("category", category);
        }
        if let Some(min) = self.min_price {
            serializer.append_pair("minPrice", &min.amount().to_string());
        }
        if let Some(max) = self.max_price {
            serializer.append_pair("maxPrice", &max.amount().to_string());
        }
        serializer.finish()
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    PriceAscending,
    PriceDescending,
    /// Newest first, i.e. identifier descending.
    #[default]
    CatalogOrder,
}

impl SortKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAscending => "price-asc",
            Self::PriceDescending => "price-desc",
            Self::CatalogOrder => "newest",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price-asc" | "price-low" | "price-ascending" => Ok(Self::PriceAscending),
            "price-desc" | "price-high" | "price-descending" => Ok(Self::PriceDescending),
            "newest" | "catalog" | "catalog-order" => Ok(Self::CatalogOrder),
            other => Err(format!("invalid sort key: {other}")),
        }
    }
}

/// Filter `products` by `spec`, then order the survivors by `sort`.
///
/// Price sorts are stable, so equal prices keep their catalog order.
#[must_use]
pub fn apply<'a>(products: &'a [Product], spec: &FilterSpec, sort: SortKey) -> Vec<&'a Product> {
    if spec.is_unsatisfiable() {
        return Vec::new();
    }

    let needle = spec.needle();
    let mut matched: Vec<&Product> = products
        .iter()
        .filter(|p| spec.admits(p, needle.as_deref()))
        .collect();

    match sort {
        SortKey::PriceAscending => matched.sort_by_key(|p| p.price),
        SortKey::PriceDescending => matched.sort_by(|a, b| b.price.cmp(&a.price)),
        SortKey::CatalogOrder => matched.sort_by(|a, b| b.id.cmp(&a.id)),
    }
    matched
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn ids(products: &[&Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_empty_spec_returns_everything() {
        let catalog = Catalog::builtin();
        let result = apply(catalog.products(), &FilterSpec::default(), SortKey::CatalogOrder);
        assert_eq!(result.len(), catalog.len());
    }

    #[test]
    fn test_catalog_order_is_newest_first() {
        let catalog = Catalog::builtin();
        let result = apply(catalog.products(), &FilterSpec::default(), SortKey::CatalogOrder);
        assert_eq!(result.first().unwrap().id.as_i32(), 30);
        assert_eq!(result.last().unwrap().id.as_i32(), 1);
    }

    #[test]
    fn test_query_is_case_insensitive_over_name_and_description() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default().with_query("  WIRELESS ");
        let result = apply(catalog.products(), &spec, SortKey::PriceAscending);
        // Name matches (1, 8, 21) and description-only matches (17)
        let mut found = ids(&result);
        found.sort_unstable();
        assert_eq!(found, vec![1, 8, 17, 21]);
    }

    #[test]
    fn test_blank_query_matches_everything() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default().with_query("   ");
        assert_eq!(
            apply(catalog.products(), &spec, SortKey::CatalogOrder).len(),
            catalog.len()
        );
    }

    #[test]
    fn test_category_is_exact() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default().with_category("Bags");
        assert_eq!(
            ids(&apply(catalog.products(), &spec, SortKey::CatalogOrder)),
            vec![22, 5]
        );

        let spec = FilterSpec::default().with_category("bags");
        assert!(apply(catalog.products(), &spec, SortKey::CatalogOrder).is_empty());
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default()
            .with_price_range(Some(Price::from_cents(3999)), Some(Price::from_cents(5999)));
        assert_eq!(
            ids(&apply(catalog.products(), &spec, SortKey::PriceAscending)),
            vec![21, 26, 30]
        );
    }

    #[test]
    fn test_inverted_bounds_yield_empty() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default()
            .with_price_range(Some(Price::from_cents(10000)), Some(Price::from_cents(5000)));
        assert!(spec.is_unsatisfiable());
        assert!(apply(catalog.products(), &spec, SortKey::PriceAscending).is_empty());
    }

    #[test]
    fn test_price_ascending_is_non_decreasing_and_deterministic() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default();
        let first = apply(catalog.products(), &spec, SortKey::PriceAscending);
        assert!(first.windows(2).all(|w| match w {
            [a, b] => a.price <= b.price,
            _ => true,
        }));
        let second = apply(catalog.products(), &spec, SortKey::PriceAscending);
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_price_descending_within_category() {
        let catalog = Catalog::builtin();
        let spec = FilterSpec::default().with_category("Electronics");
        let result = apply(catalog.products(), &spec, SortKey::PriceDescending);
        assert_eq!(ids(&result), vec![10, 28, 1, 6, 8, 12, 3, 21]);
    }

    #[test]
    fn test_sort_key_parse_and_display() {
        assert_eq!("price-low".parse::<SortKey>().unwrap(), SortKey::PriceAscending);
        assert_eq!("Price-High".parse::<SortKey>().unwrap(), SortKey::PriceDescending);
        assert_eq!("newest".parse::<SortKey>().unwrap(), SortKey::CatalogOrder);
        assert!("random".parse::<SortKey>().is_err());
        assert_eq!(SortKey::PriceAscending.to_string(), "price-asc");
    }

    #[test]
    fn test_query_string_roundtrip() {
        let spec = FilterSpec::default()
            .with_query("leather bag")
            .with_category("Bags")
            .with_price_range(Some(Price::from_cents(5000)), None);
        let encoded = spec.to_query_string();
        assert_eq!(encoded, "q=leather+bag&category=Bags&minPrice=50");
        assert_eq!(FilterSpec::from_query_string(&format!("?{encoded}")), spec);
    }

    #[test]
    fn test_from_query_string_ignores_garbage() {
        let spec = FilterSpec::from_query_string("q=&minPrice=cheap&maxPrice=100&page=2");
        assert_eq!(spec.query, None);
        assert_eq!(spec.min_price, None);
        assert_eq!(spec.max_price, Some(Price::from_cents(10000)));
    }
}
