//! # Domain Types
//!
//! Core domain types for Tally POS.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Domain Model Overview                              │
//! │                                                                         │
//! │  ┌──────────────┐  compute   ┌───────────────────┐                     │
//! │  │   LineItem   │───────────►│  ReceiptDocument  │                     │
//! │  │──────────────│   (1..N)   │───────────────────│                     │
//! │  │ name         │            │ receipt_number    │                     │
//! │  │ quantity     │            │ customer_name     │                     │
//! │  │ unit_price   │            │ lines[ReceiptLine]│                     │
//! │  │ category?    │            │ subtotal/vat/total│                     │
//! │  └──────┬───────┘            └───────────────────┘                     │
//! │         │ deduct (by normalized name)                                   │
//! │         ▼                                                               │
//! │  ┌──────────────────┐        ┌───────────────────┐                     │
//! │  │ InventoryRecord  │───────►│ DeductionWarning  │ (NOT_FOUND,         │
//! │  │ (external store) │        └───────────────────┘  INSUFFICIENT_STOCK)│
//! │  └──────────────────┘                                                   │
//! │                                                                         │
//! │  UserRecord: issuer name + role for the service layer                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate in basis points (1 bp = 0.01%).
///
/// ## Examples
/// - 750 bps = 7.5% (VAT)
/// - 0 bps = tax exempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// The rate as an exact fraction (750 bps → 0.0750).
    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// The rate as a percentage without trailing zeros (750 bps → 7.5).
    pub fn percentage(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2).normalize()
    }
}

/// Renders as `7.5%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One purchased entry as keyed in by the clerk.
///
/// Immutable once queued: edits are a remove plus a fresh add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        LineItem {
            name: name.into(),
            quantity,
            unit_price,
            category: None,
        }
    }

    /// Tags the line with a product category (shown as its own column).
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = if category.trim().is_empty() {
            None
        } else {
            Some(category)
        };
        self
    }

    /// `quantity × unit_price`, exact. `None` if the product overflows.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Receipt Document
// =============================================================================

/// A priced line on a finished receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub item: LineItem,
    pub line_total: Money,
}

/// The finalized, priced transaction record.
///
/// ## Invariants
/// - `line_total == quantity × unit_price` for every line
/// - `subtotal == Σ line_total`
/// - `vat_amount == subtotal × vat_rate`
/// - `total == subtotal + vat_amount`
///
/// All amounts are exact; round only when presenting.
///
/// `receipt_number` is what the customer sees and is only unique per
/// calculator. `id` is unique per document and keys anything that must
/// happen once per receipt, such as stock deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptDocument {
    pub id: Uuid,
    pub receipt_number: String,
    pub issued_at: DateTime<Utc>,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub vat_rate: TaxRate,
    pub subtotal: Money,
    pub vat_amount: Money,
    pub total: Money,
}

impl ReceiptDocument {
    /// Download/file name: `receipt_<number>.pdf`.
    pub fn file_name(&self) -> String {
        format!("receipt_{}.pdf", self.receipt_number)
    }

    /// Object storage key: `receipts/receipt_<number>.pdf`.
    pub fn storage_key(&self) -> String {
        format!("receipts/{}", self.file_name())
    }

    /// Number of receipt rows (not units).
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Whether any row carries a category (adds a table column).
    pub fn has_categories(&self) -> bool {
        self.lines.iter().any(|l| l.item.category.is_some())
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// A stock record owned by the inventory store.
///
/// The core only reads these and proposes new quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: String,
    pub item_name: String,
    pub quantity_on_hand: i64,
    pub unit_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Why a line could not be fully deducted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeductionReason {
    /// No inventory record matches the item name.
    NotFound,
    /// Fewer units on hand than sold; stock was clamped to zero.
    InsufficientStock,
}

impl fmt::Display for DeductionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeductionReason::NotFound => write!(f, "NOT_FOUND"),
            DeductionReason::InsufficientStock => write!(f, "INSUFFICIENT_STOCK"),
        }
    }
}

/// Non-fatal notice produced while deducting stock.
///
/// `available_qty` is 0 for [`DeductionReason::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionWarning {
    pub item_name: String,
    pub reason: DeductionReason,
    pub requested_qty: i64,
    pub available_qty: i64,
}

impl fmt::Display for DeductionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            DeductionReason::NotFound => {
                write!(f, "'{}' not found in inventory", self.item_name)
            }
            DeductionReason::InsufficientStock => write!(
                f,
                "Insufficient stock for '{}': available {}, requested {}",
                self.item_name, self.available_qty, self.requested_qty
            ),
        }
    }
}

// =============================================================================
// Users & Receipt Log
// =============================================================================

/// An authenticated clerk or admin.
///
/// `role` is opaque to the core; the service layer gates on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

impl UserRecord {
    /// Set-membership role check.
    ///
    /// ```rust
    /// use tally_core::UserRecord;
    ///
    /// let user = UserRecord {
    ///     id: "1".into(),
    ///     username: "ada".into(),
    ///     full_name: "Ada Obi".into(),
    ///     role: "cashier".into(),
    /// };
    /// assert!(user.has_role(&["admin", "cashier"]));
    /// assert!(!user.has_role(&["admin"]));
    /// ```
    pub fn has_role(&self, allowed: &[&str]) -> bool {
        allowed.iter().any(|role| *role == self.role)
    }
}

/// One row of the flat receipt log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptHistoryEntry {
    pub receipt_number: String,
    pub customer_name: String,
    pub total_amount: Money,
    pub issuer_name: Option<String>,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_display() {
        assert_eq!(TaxRate::from_bps(750).to_string(), "7.5%");
        assert_eq!(TaxRate::from_bps(1000).to_string(), "10%");
        assert_eq!(TaxRate::zero().to_string(), "0%");
    }

    #[test]
    fn test_line_total() {
        let line = LineItem::new("Ankara", 2, Money::from_major(5000));
        assert_eq!(line.line_total(), Some(Money::from_major(10000)));
    }

    #[test]
    fn test_blank_category_is_dropped() {
        let line = LineItem::new("Lace", 1, Money::from_major(1)).with_category("  ");
        assert_eq!(line.category, None);

        let line = LineItem::new("Lace", 1, Money::from_major(1)).with_category("Fabric");
        assert_eq!(line.category.as_deref(), Some("Fabric"));
    }

    #[test]
    fn test_deduction_reason_wire_format() {
        let json = serde_json::to_string(&DeductionReason::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }

    #[test]
    fn test_warning_message() {
        let warning = DeductionWarning {
            item_name: "Lace".to_string(),
            reason: DeductionReason::InsufficientStock,
            requested_qty: 8,
            available_qty: 5,
        };
        assert_eq!(
            warning.to_string(),
            "Insufficient stock for 'Lace': available 5, requested 8"
        );
    }
}
