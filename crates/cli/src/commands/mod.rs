//! Command implementations.
//!
//! Each command writes its report to the given writer; logs go through
//! `tracing` to stderr.

pub mod browse;
pub mod checkout;
pub mod remote;

use emerald_core::ProductId;
use emerald_storefront::StorefrontError;
use emerald_storefront::catalog::CatalogError;
use emerald_storefront::config::ConfigError;
use emerald_storefront::remote::RemoteError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Storefront(#[from] StorefrontError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid order file: {0}")]
    OrderFile(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid order file: product {0} is listed under both items and sale")]
    DuplicateProduct(ProductId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No remote data service configured (set EMERALD_REMOTE_URL and EMERALD_REMOTE_API_KEY)")]
    NoRemote,
}
