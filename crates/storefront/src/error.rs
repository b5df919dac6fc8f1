//! Unified error handling for storefront sessions.
//!
//! Every rejected operation leaves the cart, wishlist and checkout in their
//! prior state, so callers can report the error and keep using the session.

use std::fmt;

use thiserror::Error;

use crate::catalog::CatalogError;

/// A field on one of the checkout forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutField {
    FirstName,
    LastName,
    Email,
    Address,
    City,
    State,
    ZipCode,
    CardNumber,
    Expiry,
    Cvv,
}

impl CheckoutField {
    /// Human-readable label, as shown next to the form input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::Email => "Email",
            Self::Address => "Address",
            Self::City => "City",
            Self::State => "State",
            Self::ZipCode => "ZIP Code",
            Self::CardNumber => "Card Number",
            Self::Expiry => "Expiry Date",
            Self::Cvv => "CVV",
        }
    }
}

impl fmt::Display for CheckoutField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What is wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// Required but empty.
    Missing,
    /// Present but not in an acceptable format.
    Malformed(String),
}

/// A field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: CheckoutField,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::Malformed(reason) => write!(f, "{}: {reason}", self.field),
        }
    }
}

/// All field errors found on one form submission. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Wrap collected field errors, or `None` if there are none.
    #[must_use]
    pub fn from_errors(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// A single field error.
    #[must_use]
    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    /// The individual field errors, in form order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Fields that were left empty.
    pub fn missing_fields(&self) -> impl Iterator<Item = CheckoutField> + '_ {
        self.0
            .iter()
            .filter(|e| e.problem == FieldProblem::Missing)
            .map(|e| e.field)
    }

    /// Whether `field` has any error.
    #[must_use]
    pub fn has(&self, field: CheckoutField) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Session-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// A checkout form failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Referenced product does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not allowed in the current checkout state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Quantity outside the accepted range.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// The catalog could not be loaded.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl From<ValidationErrors> for StorefrontError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error. Without an initialized Sentry client this is a no-op.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
