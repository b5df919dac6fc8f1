//! Shipping step form and its validated result.

use emerald_core::{Email, EmailError};
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutField, FieldError, FieldProblem, ValidationErrors};
use crate::identity::Customer;

/// Raw shipping form input. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

/// Shipping details that passed validation, with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ShippingDetails {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl ShippingForm {
    /// A form with name and email taken from the signed-in customer.
    #[must_use]
    pub fn prefilled_for(customer: &Customer) -> Self {
        let (first, last) = customer.name_parts();
        Self {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: customer.email.to_string(),
            ..Self::default()
        }
    }

    /// Check every field, collecting all problems in form order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming each empty field and a malformed email.
    pub fn validate(&self) -> Result<ShippingDetails, ValidationErrors> {
        let mut errors = Vec::new();

        let first_name = required(&mut errors, CheckoutField::FirstName, &self.first_name);
        let last_name = required(&mut errors, CheckoutField::LastName, &self.last_name);
        let email = Email::parse(&self.email).map_err(|e| FieldError {
            field: CheckoutField::Email,
            problem: match e {
                EmailError::Empty => FieldProblem::Missing,
                other => FieldProblem::Malformed(other.to_string()),
            },
        });
        if let Err(e) = &email {
            errors.push(e.clone());
        }
        let address = required(&mut errors, CheckoutField::Address, &self.address);
        let city = required(&mut errors, CheckoutField::City, &self.city);
        let state = required(&mut errors, CheckoutField::State, &self.state);
        let zip_code = required(&mut errors, CheckoutField::ZipCode, &self.zip_code);

        if let Some(errors) = ValidationErrors::from_errors(errors) {
            return Err(errors);
        }

        Ok(ShippingDetails {
            first_name,
            last_name,
            email: email.map_err(ValidationErrors::single)?,
            address,
            city,
            state,
            zip_code,
        })
    }
}

/// Trim `value`, recording a missing-field error if nothing is left.
pub(super) fn required(errors: &mut Vec<FieldError>, field: CheckoutField, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError {
            field,
            problem: FieldProblem::Missing,
        });
    }
    value.to_string()
}
