//! Emerald Market storefront core.
//!
//! An in-memory shopping session: a read-only product [`catalog`], a
//! [`cart`], a [`wishlist`], product [`filter`]ing and sorting, the sale
//! listing in [`promotions`], and the [`checkout`] step machine. A
//! [`session::Session`] ties them together for one shopper.
//!
//! The optional [`remote`] module talks to a PostgREST-style data service and
//! is never called from the session itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use emerald_core::ProductId;
//! use emerald_storefront::catalog::Catalog;
//! use emerald_storefront::checkout::PaymentForm;
//! use emerald_storefront::session::Session;
//!
//! let mut session = Session::new(Arc::new(Catalog::builtin()));
//! session.add_to_cart(ProductId::new(21))?;
//!
//! let mut shipping = session.begin_checkout()?;
//! shipping.first_name = "Ada".into();
//! // ...
//! session.submit_shipping(&shipping)?;
//! let confirmation = session.submit_payment(&PaymentForm::new("4242 4242 4242 4242", "12/27", "123"))?;
//! session.finish_checkout()?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filter;
pub mod identity;
pub mod promotions;
pub mod remote;
pub mod session;
pub mod wishlist;

pub use error::{Result, StorefrontError};
pub use session::Session;
