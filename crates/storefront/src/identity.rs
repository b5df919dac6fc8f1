//! Customer identity as an injected capability.
//!
//! The storefront never authenticates anyone itself. A session is handed an
//! [`IdentityProvider`] and asks it who (if anyone) is signed in.

use emerald_core::Email;
use serde::{Deserialize, Serialize};

/// A signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Identifier assigned by the identity service.
    pub id: String,
    pub email: Email,
    /// Display name, usually "First Last".
    pub name: String,
}

impl Customer {
    /// Split the display name at the first whitespace into (first, last).
    #[must_use]
    pub fn name_parts(&self) -> (&str, &str) {
        let name = self.name.trim();
        name.split_once(char::is_whitespace)
            .map_or((name, ""), |(first, last)| (first, last.trim()))
    }
}

/// Source of the current customer's identity.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in customer, or `None` for a guest.
    fn current_customer(&self) -> Option<Customer>;
}

/// Nobody is signed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guest;

impl IdentityProvider for Guest {
    fn current_customer(&self) -> Option<Customer> {
        None
    }
}

/// Always reports the same customer.
#[derive(Debug, Clone)]
pub struct FixedIdentity(Customer);

impl FixedIdentity {
    #[must_use]
    pub const fn new(customer: Customer) -> Self {
        Self(customer)
    }
}

impl IdentityProvider for FixedIdentity {
    fn current_customer(&self) -> Option<Customer> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer(name: &str) -> Customer {
        Customer {
            id: "c-1".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_name_parts() {
        assert_eq!(customer("Ada Lovelace").name_parts(), ("Ada", "Lovelace"));
        assert_eq!(
            customer(" Ada  King Lovelace ").name_parts(),
            ("Ada", "King Lovelace")
        );
        assert_eq!(customer("Ada").name_parts(), ("Ada", ""));
    }

    #[test]
    fn test_providers() {
        assert!(Guest.current_customer().is_none());
        let fixed = FixedIdentity::new(customer("Ada Lovelace"));
        assert_eq!(fixed.current_customer().unwrap().id, "c-1");
    }
}
