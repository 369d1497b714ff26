//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Exact Until Printed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Exact decimals (rust_decimal)                            │
//! │    line totals, subtotal and VAT are accumulated at full precision     │
//! │    rounding to 2 places happens ONLY in `rounded()` / formatting       │
//! │                                                                         │
//! │    unit 3333.335 × 3 = 10000.005 → printed "N10,000.01"                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::{format_currency, Money};
//!
//! let price = Money::from_major(5000);
//! let line_total = price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(format_currency(line_total, "N"), "N10,000.00");
//! ```
//!
//! Arithmetic is checked: the decimal range is finite (about 7.9 × 10²⁸),
//! and every operation returns `None` instead of panicking past it.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Decimal places used for display and storage rounding.
pub const DISPLAY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in major units (naira, dollars) backed by an exact decimal.
///
/// Serializes as a string (`"5000.00"`) so no precision is lost in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a whole-unit amount.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// assert_eq!(Money::from_major(15000).to_string(), "15000.00");
    /// ```
    pub fn from_major(major: i64) -> Self {
        Money(Decimal::from(major))
    }

    /// Creates an amount from minor units (kobo, cents).
    pub fn from_minor(minor: i64) -> Self {
        Money(Decimal::new(minor, DISPLAY_SCALE))
    }

    /// Parses a user-entered amount such as `"5000"`, `"4,999.50"` or `"N 120"`.
    ///
    /// Thousands separators, surrounding whitespace and a leading currency
    /// letter are tolerated. Anything else fails with
    /// [`ValidationError::InvalidFormat`] on `field`.
    pub fn parse(input: &str, field: &str) -> Result<Self, ValidationError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches(|c: char| c.is_alphabetic())
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();

        if cleaned.is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }

        Decimal::from_str(&cleaned)
            .map(Money)
            .map_err(|e| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns the exact underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Multiplies a unit price by a quantity, exactly.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit = Money::parse("2.99", "unit_price").unwrap();
    /// assert_eq!(
    ///     unit.checked_multiply_quantity(3),
    ///     Some(Money::parse("8.97", "x").unwrap())
    /// );
    /// ```
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Calculates tax at `rate` without rounding.
    ///
    /// Basis points divide exactly into a decimal, so
    /// `subtotal.checked_add(vat)` is the exact total.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::TaxRate;
    ///
    /// let vat = Money::from_major(25000).checked_tax(TaxRate::from_bps(750));
    /// assert_eq!(vat, Some(Money::from_major(1875)));
    /// ```
    pub fn checked_tax(&self, rate: TaxRate) -> Option<Money> {
        self.0.checked_mul(rate.as_fraction()).map(Money)
    }

    /// Adds up `amounts`, or `None` if the total leaves the decimal range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }

    /// Rounds to 2 decimal places, half away from zero.
    ///
    /// Only call this at the edge (display, storage of totals).
    pub fn rounded(&self) -> Money {
        let mut rounded = self
            .0
            .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(DISPLAY_SCALE);
        Money(rounded)
    }
}

// =============================================================================
// Display Formatting
// =============================================================================

/// Formats an amount for display: 2 decimals, thousands grouped, currency prefix.
///
/// Negative amounts put the sign before the symbol.
///
/// ```rust
/// use tally_core::money::{format_currency, Money};
///
/// assert_eq!(format_currency(Money::from_major(26875), "N"), "N26,875.00");
/// assert_eq!(format_currency(Money::from_minor(-550), "$"), "-$5.50");
/// assert_eq!(format_currency(Money::zero(), "N"), "N0.00");
/// ```
pub fn format_currency(amount: Money, symbol: &str) -> String {
    let rounded = amount.rounded();
    let sign = if rounded.is_negative() { "-" } else { "" };
    let plain = rounded.0.abs().to_string();

    let (whole, fraction) = match plain.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (plain.as_str(), "00"),
    };

    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain 2-decimal rendering without symbol or grouping (`"25000.00"`).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rounded().0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::parse(s, "amount").unwrap()
    }

    #[test]
    fn test_parse_accepts_grouping_and_symbol() {
        assert_eq!(money("4,999.50"), Money::from_minor(499950));
        assert_eq!(money("  N 120 "), Money::from_major(120));
        assert_eq!(money("0"), Money::zero());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Money::parse("12x", "lines[0].unit_price").unwrap_err();
        assert_eq!(err.field(), "lines[0].unit_price");

        let err = Money::parse("   ", "unit_price").unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_tax_is_exact() {
        let subtotal = money("99.99");
        let vat = subtotal.checked_tax(TaxRate::from_bps(750)).unwrap();
        assert_eq!(vat, money("7.49925"));
        assert_eq!(vat.rounded(), money("7.50"));
    }

    #[test]
    fn test_no_intermediate_rounding() {
        // Rounding each line would give 3 × 3333.34 = 10000.02
        let unit = money("3333.335");
        let total = unit.checked_multiply_quantity(3).unwrap();
        assert_eq!(total, money("10000.005"));
        assert_eq!(format_currency(total, "N"), "N10,000.01");
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(money("0.125").rounded(), money("0.13"));
        assert_eq!(money("-0.125").rounded(), money("-0.13"));
        assert_eq!(money("2.5").rounded().to_string(), "2.50");
    }

    #[test]
    fn test_format_currency_grouping() {
        assert_eq!(format_currency(money("5000"), "N"), "N5,000.00");
        assert_eq!(format_currency(money("999.999"), "N"), "N1,000.00");
        assert_eq!(format_currency(money("1234567.8"), "N "), "N 1,234,567.80");
        assert_eq!(format_currency(money("12"), ""), "12.00");
    }

    #[test]
    fn test_checked_sum() {
        let lines = [money("10000"), money("15000")];
        assert_eq!(Money::checked_sum(lines), Some(money("25000")));
    }

    #[test]
    fn test_overflow_is_none_not_panic() {
        let huge = money("50000000000000000000000000000");
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Money::checked_sum([huge, huge]), None);
        assert_eq!(
            money("10000000000000000000").checked_multiply_quantity(10_000_000_000),
            None
        );
        assert!(huge.checked_tax(TaxRate::from_bps(750)).is_some());
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&money("26875.00")).unwrap();
        assert_eq!(json, "\"26875.00\"");
    }
}
