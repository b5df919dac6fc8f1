//! Catalog listing commands.

use std::io::{self, Write};

use emerald_core::Product;
use emerald_storefront::catalog::Catalog;
use emerald_storefront::filter::{self, FilterSpec, SortKey};
use emerald_storefront::promotions;

fn write_product(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(
        out,
        "{:>4}  {:<32} {:>10}  {}",
        product.id.as_i32(),
        product.name,
        product.price.to_string(),
        product.category
    )
}

/// Print the filtered, sorted catalog.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn browse(
    catalog: &Catalog,
    spec: &FilterSpec,
    sort: SortKey,
    out: &mut impl Write,
) -> io::Result<()> {
    if spec.is_unsatisfiable() {
        writeln!(out, "Minimum price is above maximum price; nothing matches.")?;
        return Ok(());
    }

    let results = filter::apply(catalog.products(), spec, sort);
    for product in &results {
        write_product(out, product)?;
    }

    let query = spec.to_query_string();
    if query.is_empty() {
        writeln!(out, "{} products ({sort})", results.len())
    } else {
        writeln!(out, "{} products matching ?{query} ({sort})", results.len())
    }
}

/// Print each category with its product count.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn categories(catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    for (category, products) in catalog.grouped_by_category() {
        writeln!(out, "{category:<16} {:>3}", products.len())?;
    }
    Ok(())
}

/// Print the sale listing.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn sale(catalog: &Catalog, percent: u8, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Sale: {percent}% off everything")?;
    for item in promotions::sale_listing(catalog, percent) {
        writeln!(
            out,
            "{:>4}  {:<32} {:>10}  was {}",
            item.product.id.as_i32(),
            item.product.name,
            item.sale_price.to_string(),
            item.original_price()
        )?;
    }
    Ok(())
}
