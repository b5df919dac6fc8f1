//! Emerald Market Core - Shared types library.
//!
//! This crate provides common types used across all Emerald Market components:
//! - `storefront` - In-memory shopping session (catalog, cart, wishlist, checkout)
//! - `cli` - Terminal front end driving a storefront session
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no network access,
//! no global state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, statuses
//!   and the catalog's product record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
