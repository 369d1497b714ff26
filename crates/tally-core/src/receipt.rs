//! # Receipt Calculator
//!
//! Turns an ordered list of line items into a priced [`ReceiptDocument`].
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Clerk queues: Ankara ×2 @ 5,000   Lace ×1 @ 15,000                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute("Ada", issuer, lines)                                          │
//! │       │                                                                 │
//! │       ├── validate customer + every line  ──► ValidationError (stop)    │
//! │       │                                                                 │
//! │       ├── line_total = qty × unit_price      10,000 / 15,000            │
//! │       ├── subtotal   = Σ line_total          25,000                     │
//! │       ├── vat        = subtotal × 7.5%        1,875                     │
//! │       ├── total      = subtotal + vat        26,875                     │
//! │       │                                                                 │
//! │       └── receipt_number = YYYYMMDDHHMMSSmmm (monotonic per calculator) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator performs no I/O and never retries. Apart from the receipt
//! number and timestamp, computing the same input twice yields the same
//! document.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{LineItem, ReceiptDocument, ReceiptLine, TaxRate};
use crate::validation::{validate_customer_name, validate_lines, ValidationResult};

/// `strftime` pattern for receipt numbers: UTC down to the millisecond.
pub const RECEIPT_NUMBER_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Prices receipts at a fixed VAT rate.
///
/// Holds the last issued timestamp so that two receipts computed by the same
/// calculator never share a number, even within one millisecond.
#[derive(Debug)]
pub struct ReceiptCalculator {
    vat_rate: TaxRate,
    last_issued_ms: AtomicI64,
}

impl ReceiptCalculator {
    pub fn new(vat_rate: TaxRate) -> Self {
        ReceiptCalculator {
            vat_rate,
            last_issued_ms: AtomicI64::new(i64::MIN),
        }
    }

    pub fn vat_rate(&self) -> TaxRate {
        self.vat_rate
    }

    /// Computes a receipt stamped with the current time.
    pub fn compute(
        &self,
        customer_name: &str,
        issuer_name: Option<&str>,
        lines: &[LineItem],
    ) -> ValidationResult<ReceiptDocument> {
        self.compute_at(customer_name, issuer_name, lines, Utc::now())
    }

    /// Computes a receipt stamped at `now`.
    ///
    /// ## Errors
    /// [`ValidationError`](crate::ValidationError) naming the first offending
    /// field: `customer_name`, `lines`, or `lines[i].{name,quantity,unit_price}`.
    /// Amounts beyond the decimal range fail with `TooLarge` on
    /// `lines[i].quantity` (one line) or `lines` (the totals).
    pub fn compute_at(
        &self,
        customer_name: &str,
        issuer_name: Option<&str>,
        lines: &[LineItem],
        now: DateTime<Utc>,
    ) -> ValidationResult<ReceiptDocument> {
        let customer_name = validate_customer_name(customer_name)?;
        validate_lines(lines)?;

        let mut priced = Vec::with_capacity(lines.len());
        for (index, item) in lines.iter().enumerate() {
            let line_total = item
                .line_total()
                .ok_or_else(|| too_large(format!("lines[{}].quantity", index)))?;
            priced.push(ReceiptLine {
                item: LineItem {
                    name: item.name.trim().to_string(),
                    ..item.clone()
                },
                line_total,
            });
        }

        let subtotal = Money::checked_sum(priced.iter().map(|line| line.line_total))
            .ok_or_else(|| too_large("lines"))?;
        let vat_amount = subtotal
            .checked_tax(self.vat_rate)
            .ok_or_else(|| too_large("lines"))?;
        let total = subtotal
            .checked_add(vat_amount)
            .ok_or_else(|| too_large("lines"))?;

        let issued_at = self.next_issue_time(now);

        Ok(ReceiptDocument {
            id: Uuid::new_v4(),
            receipt_number: format_receipt_number(issued_at),
            issued_at,
            customer_name,
            issuer_name: issuer_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from),
            lines: priced,
            vat_rate: self.vat_rate,
            subtotal,
            vat_amount,
            total,
        })
    }

    /// Returns `now`, or 1ms past the previous receipt if the clock has not
    /// moved on.
    fn next_issue_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let candidate = now.timestamp_millis();
        let mut issued = candidate;

        // The closure always returns Some, so this cannot fail.
        let _ = self
            .last_issued_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = if candidate > last { candidate } else { last + 1 };
                Some(issued)
            });

        Utc.timestamp_millis_opt(issued).single().unwrap_or(now)
    }
}

fn too_large(field: impl Into<String>) -> ValidationError {
    ValidationError::TooLarge {
        field: field.into(),
    }
}

/// Formats a timestamp as a receipt number (`20261018143005123`).
pub fn format_receipt_number(at: DateTime<Utc>) -> String {
    at.format(RECEIPT_NUMBER_FORMAT).to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
