//! Checkout step machine.
//!
//! A linear wizard: Shipping, then Payment, then Confirmation. The machine is
//! created from a [`CartSnapshot`] and never looks at the live cart again, so
//! the order summary stays fixed for the whole flow. A rejected submission
//! leaves the machine on the step it was on.

mod payment;
mod shipping;

pub use payment::{CardExpiry, PaymentForm, PaymentSummary};
pub use shipping::{ShippingDetails, ShippingForm};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cart::CartSnapshot;
use crate::error::{Result, StorefrontError};

/// The step a checkout is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderConfirmation {
    /// Order reference shown to the customer.
    pub reference: Uuid,
    pub placed_at: DateTime<Utc>,
    pub order: CartSnapshot,
    pub shipping: ShippingDetails,
    pub payment: PaymentSummary,
}

#[derive(Debug, Clone)]
enum Stage {
    Shipping,
    Payment { shipping: ShippingDetails },
    Confirmation(Box<OrderConfirmation>),
}

/// State of one checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutMachine {
    summary: CartSnapshot,
    stage: Stage,
}

impl CheckoutMachine {
    /// Enter checkout with a frozen copy of the cart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the snapshot has no lines.
    pub fn begin(summary: CartSnapshot) -> Result<Self> {
        if summary.is_empty() {
            warn!("Checkout rejected: cart is empty");
            return Err(StorefrontError::InvalidState(
                "cannot start checkout with an empty cart".to_string(),
            ));
        }
        Ok(Self {
            summary,
            stage: Stage::Shipping,
        })
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self.stage {
            Stage::Shipping => CheckoutStep::Shipping,
            Stage::Payment { .. } => CheckoutStep::Payment,
            Stage::Confirmation(_) => CheckoutStep::Confirmation,
        }
    }

    /// The cart as it was when checkout began.
    #[must_use]
    pub const fn order_summary(&self) -> &CartSnapshot {
        &self.summary
    }

    /// Accepted shipping details, once the shipping step is done.
    #[must_use]
    pub fn shipping(&self) -> Option<&ShippingDetails> {
        match &self.stage {
            Stage::Shipping => None,
            Stage::Payment { shipping } => Some(shipping),
            Stage::Confirmation(confirmation) => Some(&confirmation.shipping),
        }
    }

    /// The confirmation, once payment has been accepted.
    #[must_use]
    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        match &self.stage {
            Stage::Confirmation(confirmation) => Some(confirmation),
            _ => None,
        }
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<()> {
        let current = self.step();
        if current == expected {
            Ok(())
        } else {
            warn!(%current, %expected, "Checkout step submitted out of order");
            Err(StorefrontError::InvalidState(format!(
                "checkout is at the {current} step, not {expected}"
            )))
        }
    }

    /// Validate shipping details and advance to Payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when not on the shipping step and `Validation`
    /// when any field is missing or malformed.
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<()> {
        self.expect_step(CheckoutStep::Shipping)?;
        let shipping = form.validate().inspect_err(|errors| {
            warn!(%errors, "Shipping step rejected");
        })?;
        self.stage = Stage::Payment { shipping };
        Ok(())
    }

    /// Validate payment details and advance to Confirmation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` when not on the payment step and `Validation`
    /// when any field is missing or malformed.
    pub fn submit_payment(&mut self, form: &PaymentForm) -> Result<OrderConfirmation> {
        self.expect_step(CheckoutStep::Payment)?;
        let payment = form.validate().inspect_err(|errors| {
            warn!(%errors, "Payment step rejected");
        })?;

        let Stage::Payment { shipping } = &self.stage else {
            return Err(StorefrontError::InvalidState(
                "shipping details missing".to_string(),
            ));
        };

        let confirmation = OrderConfirmation {
            reference: Uuid::new_v4(),
            placed_at: Utc::now(),
            order: self.summary.clone(),
            shipping: shipping.clone(),
            payment,
        };
        info!(
            reference = %confirmation.reference,
            total = %confirmation.order.total(),
            items = confirmation.order.item_count(),
            "Order confirmed"
        );
        self.stage = Stage::Confirmation(Box::new(confirmation.clone()));
        Ok(confirmation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emerald_core::{Price, Product, ProductId};

    use super::*;
    use crate::cart::CartStore;
    use crate::error::CheckoutField;

    fn snapshot() -> CartSnapshot {
        let mut cart = CartStore::new();
        let product = Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            price: Price::from_cents(1000),
            description: String::new(),
            image: String::new(),
            category: "Test".to_string(),
        };
        cart.add_item(&product);
        cart.set_quantity(product.id, 5).unwrap();
        cart.snapshot()
    }

    fn shipping_form() -> ShippingForm {
        ShippingForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "LDN".to_string(),
            zip_code: "10001".to_string(),
        }
    }

    fn payment_form() -> PaymentForm {
        PaymentForm::new("4242 4242 4242 4242", "12/27", "123")
    }

    #[test]
    fn test_empty_cart_cannot_begin() {
        let result = CheckoutMachine::begin(CartStore::new().snapshot());
        assert!(matches!(result, Err(StorefrontError::InvalidState(_))));
    }

    #[test]
    fn test_happy_path() {
        let mut machine = CheckoutMachine::begin(snapshot()).unwrap();
        assert_eq!(machine.step(), CheckoutStep::Shipping);
        assert!(machine.shipping().is_none());

        machine.submit_shipping(&shipping_form()).unwrap();
        assert_eq!(machine.step(), CheckoutStep::Payment);
        assert_eq!(machine.shipping().unwrap().city, "London");

        let confirmation = machine.submit_payment(&payment_form()).unwrap();
        assert_eq!(machine.step(), CheckoutStep::Confirmation);
        assert_eq!(confirmation.order.total(), Price::from_cents(5000));
        assert_eq!(confirmation.payment.last_four, "4242");
        assert_eq!(machine.confirmation(), Some(&confirmation));
    }

    #[test]
    fn test_missing_field_stays_on_shipping() {
        let mut machine = CheckoutMachine::begin(snapshot()).unwrap();
        let mut form = shipping_form();
        form.city = String::new();

        let err = machine.submit_shipping(&form).unwrap_err();
        match err {
            StorefrontError::Validation(errors) => {
                assert_eq!(
                    errors.missing_fields().collect::<Vec<_>>(),
                    vec![CheckoutField::City]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(machine.step(), CheckoutStep::Shipping);
        assert_eq!(machine.order_summary().total(), Price::from_cents(5000));
    }

    #[test]
    fn test_out_of_order_submissions() {
        let mut machine = CheckoutMachine::begin(snapshot()).unwrap();
        assert!(matches!(
            machine.submit_payment(&payment_form()),
            Err(StorefrontError::InvalidState(_))
        ));
        assert_eq!(machine.step(), CheckoutStep::Shipping);

        machine.submit_shipping(&shipping_form()).unwrap();
        assert!(matches!(
            machine.submit_shipping(&shipping_form()),
            Err(StorefrontError::InvalidState(_))
        ));
        assert_eq!(machine.step(), CheckoutStep::Payment);

        machine.submit_payment(&payment_form()).unwrap();
        assert!(matches!(
            machine.submit_payment(&payment_form()),
            Err(StorefrontError::InvalidState(_))
        ));
        assert_eq!(machine.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn test_bad_payment_stays_on_payment() {
        let mut machine = CheckoutMachine::begin(snapshot()).unwrap();
        machine.submit_shipping(&shipping_form()).unwrap();

        let bad = PaymentForm::new("1234 5678 9012 3456", "12/27", "123");
        assert!(matches!(
            machine.submit_payment(&bad),
            Err(StorefrontError::Validation(_))
        ));
        assert_eq!(machine.step(), CheckoutStep::Payment);
        assert!(machine.confirmation().is_none());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(CheckoutStep::Payment.to_string(), "payment");
    }
}
