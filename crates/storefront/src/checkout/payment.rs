//! Payment step form.
//!
//! Card data is checked for format only; nothing is charged. The card number
//! and CVV are held as secrets and dropped once validation succeeds. Only the
//! last four digits survive into the order confirmation.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::{CheckoutField, FieldError, FieldProblem, ValidationErrors};

use super::shipping::required;

const CARD_DIGITS_MIN: usize = 13;
const CARD_DIGITS_MAX: usize = 19;

/// Raw payment form input.
#[derive(Debug)]
pub struct PaymentForm {
    pub card_number: SecretString,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: SecretString,
}

impl PaymentForm {
    pub fn new(
        card_number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
    ) -> Self {
        Self {
            card_number: SecretString::from(card_number.into()),
            expiry: expiry.into(),
            cvv: SecretString::from(cvv.into()),
        }
    }

    /// Check every field, collecting all problems in form order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming each empty or malformed field.
    pub fn validate(&self) -> Result<PaymentSummary, ValidationErrors> {
        let mut errors = Vec::new();

        let card = checked(
            &mut errors,
            CheckoutField::CardNumber,
            self.card_number.expose_secret(),
            card_digits,
        );
        let expiry = checked(&mut errors, CheckoutField::Expiry, &self.expiry, CardExpiry::parse);
        let cvv = checked(&mut errors, CheckoutField::Cvv, self.cvv.expose_secret(), cvv_format);

        if let Some(errors) = ValidationErrors::from_errors(errors) {
            return Err(errors);
        }

        cvv.map_err(ValidationErrors::single)?;
        Ok(PaymentSummary {
            last_four: last_four(&card.map_err(ValidationErrors::single)?),
            expiry: expiry.map_err(ValidationErrors::single)?,
        })
    }
}

/// Require `value` and run `parse` on the trimmed input, recording any failure.
fn checked<T>(
    errors: &mut Vec<FieldError>,
    field: CheckoutField,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, &'static str>,
) -> Result<T, FieldError> {
    let value = required(errors, field, value);
    if value.is_empty() {
        return Err(FieldError {
            field,
            problem: FieldProblem::Missing,
        });
    }
    parse(&value).map_err(|reason| {
        let error = malformed(field, reason);
        errors.push(error.clone());
        error
    })
}

fn malformed(field: CheckoutField, reason: &str) -> FieldError {
    FieldError {
        field,
        problem: FieldProblem::Malformed(reason.to_string()),
    }
}

/// Strip spaces and dashes, then check length and the Luhn checksum.
fn card_digits(input: &str) -> Result<String, &'static str> {
    let digits: String = input.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("must contain only digits");
    }
    if !(CARD_DIGITS_MIN..=CARD_DIGITS_MAX).contains(&digits.len()) {
        return Err("must be 13 to 19 digits");
    }
    if !luhn_valid(&digits) {
        return Err("is not a valid card number");
    }
    Ok(digits)
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

fn cvv_format(input: &str) -> Result<(), &'static str> {
    if (3..=4).contains(&input.len()) && input.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err("must be 3 or 4 digits")
    }
}

fn last_four(digits: &str) -> String {
    let skip = digits.chars().count().saturating_sub(4);
    digits.chars().skip(skip).collect()
}

/// Card expiry month and two-digit year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardExpiry {
    pub month: u8,
    pub year: u8,
}

impl CardExpiry {
    fn parse(input: &str) -> Result<Self, &'static str> {
        const FORMAT: &str = "must be in MM/YY format";

        let (month, year) = input.split_once('/').ok_or(FORMAT)?;
        let (month, year) = (month.trim(), year.trim());
        if month.len() != 2 || year.len() != 2 {
            return Err(FORMAT);
        }
        let month: u8 = month.parse().map_err(|_| FORMAT)?;
        let year: u8 = year.parse().map_err(|_| FORMAT)?;
        if !(1..=12).contains(&month) {
            return Err("month must be between 01 and 12");
        }
        Ok(Self { month, year })
    }
}

impl fmt::Display for CardExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year)
    }
}

/// What is retained about the card after a successful payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub last_four: String,
    pub expiry: CardExpiry,
}

impl fmt::Display for PaymentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**** {} (exp {})", self.last_four, self.expiry)
    }
}
