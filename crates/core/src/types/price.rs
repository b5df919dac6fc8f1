//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are in the store currency's standard unit (dollars, not
//! cents). Prices are never negative and never above [`Price::MAX`]; the
//! constructors and the `serde` implementation both enforce this.
//!
//! Arithmetic never panics. With unit prices capped, a line total is at most
//! `Price::MAX * u32::MAX`, far inside `Decimal`'s range; sums that would
//! still overflow saturate at `Decimal::MAX`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
    /// The amount is above [`Price::MAX`].
    #[error("price cannot exceed {max} (got {0})", max = Price::MAX)]
    TooLarge(Decimal),
    /// The input is not a decimal number.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount.
///
/// ## Examples
///
/// ```
/// use emerald_core::Price;
///
/// let unit = Price::from_cents(1999);
/// assert_eq!(unit.to_string(), "$19.99");
/// assert_eq!(unit.times(3).to_string(), "$59.97");
/// assert!("-1.00".parse::<Price>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest accepted unit price: one billion.
    pub const MAX: Self = Self(Decimal::from_parts(1_000_000_000, 0, 0, false, 0));

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero, or
    /// [`PriceError::TooLarge`] if it is above [`Price::MAX`].
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount.normalize()))
    }

    /// Create a price from an amount in cents.
    ///
    /// `u32::MAX` cents is below [`Price::MAX`], so this cannot fail.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::from_i128_with_scale(i128::from(cents), 2).normalize())
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Apply a percentage discount, rounding to whole currency units.
    ///
    /// Midpoints round away from zero. Discounts above 100% are treated as 100%.
    #[must_use]
    pub fn discounted(self, percent: u8) -> Self {
        let kept = Decimal::from(100 - percent.min(100));
        // Discounting never increases the amount, so only the multiply can overflow.
        let raw = self
            .0
            .checked_mul(kept)
            .map_or(self.0, |scaled| scaled / Decimal::ONE_HUNDRED);
        Self(raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = PriceError;

    /// Parse `"19.99"` or `"$19.99"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let amount =
            Decimal::from_str(digits).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(29999).amount(), Decimal::new(29999, 2));
        assert_eq!(Price::from_cents(0), Price::ZERO);
    }

    #[test]
    fn test_equal_amounts_compare_equal_regardless_of_scale() {
        let a = Price::new(Decimal::new(1000, 2)).unwrap();
        let b = Price::new(Decimal::new(10, 0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(1000).times(3), Price::from_cents(2000)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(5000));
    }

    #[test]
    fn test_discounted_rounds_to_whole_units() {
        // 299.99 * 0.7 = 209.993
        assert_eq!(Price::from_cents(29999).discounted(30), Price::from_cents(21000));
        // 39.99 * 0.7 = 27.993
        assert_eq!(Price::from_cents(3999).discounted(30), Price::from_cents(2800));
        // 5.00 * 0.5 = 2.50 rounds away from zero
        assert_eq!(Price::from_cents(500).discounted(50), Price::from_cents(300));
        assert_eq!(Price::from_cents(500).discounted(200), Price::ZERO);
    }

    #[test]
    fn test_rejects_amounts_above_max() {
        assert_eq!(Price::new(Price::MAX.amount()), Ok(Price::MAX));
        let huge = Decimal::from_str("39614081257132168796771975168").unwrap();
        assert!(matches!(Price::new(huge), Err(PriceError::TooLarge(_))));
        assert!(serde_json::from_str::<Price>("1000000000.01").is_err());
        assert!("2000000000".parse::<Price>().is_err());
    }

    #[test]
    fn test_arithmetic_at_the_limits_does_not_panic() {
        let line = Price::MAX.times(u32::MAX);
        assert_eq!(
            line.amount(),
            Decimal::from(1_000_000_000_u64) * Decimal::from(u32::MAX)
        );
        assert_eq!(
            Price::MAX.discounted(30),
            Price::new(Decimal::from(700_000_000)).unwrap()
        );

        let saturated = Price(Decimal::MAX) + line;
        assert_eq!(saturated.amount(), Decimal::MAX);
        assert_eq!(Price(Decimal::MAX).times(2).amount(), Decimal::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(5).to_string(), "$0.05");
        assert_eq!(Price::from_cents(5000).to_string(), "$50.00");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("$12.50".parse::<Price>().unwrap(), Price::from_cents(1250));
        assert_eq!(" 8 ".parse::<Price>().unwrap(), Price::from_cents(800));
        assert!(matches!(
            "abc".parse::<Price>(),
            Err(PriceError::Invalid(_))
        ));
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_rejects_negatives() {
        let price: Price = serde_json::from_str("299.99").unwrap();
        assert_eq!(price, Price::from_cents(29999));
        assert!(serde_json::from_str::<Price>("-5").is_err());
    }
}
