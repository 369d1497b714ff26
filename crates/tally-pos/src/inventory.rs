//! # Inventory Deduction
//!
//! Takes sold units off the shelf count after a receipt is issued.
//!
//! ## Per-Line Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for (index, line) in document.lines (in order, one at a time)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.deduct_line(LineRequest { document.id, index, name, qty })      │
//! │       │                                                                 │
//! │       ├── Applied { available_before } → plan_deduction → warning?     │
//! │       ├── NotFound                     → NOT_FOUND warning             │
//! │       ├── AlreadyApplied               → skipped (retry)               │
//! │       └── Err(e)                       → DeductionFailure, continue    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Nothing here returns an error: every outcome lands in the report.
//!
//! Lines are keyed on the document's UUID, not its receipt number, so two
//! tills that print the same number never swallow each other's deduction.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tally_core::{not_found_warning, plan_deduction, DeductionWarning, ReceiptDocument};
use tally_db::{Database, DbError, LineDeduction};
use tracing::{debug, error, info, warn};

use crate::error::DeductionFailure;

/// One receipt line to take off the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRequest<'a> {
    /// `ReceiptDocument::id`, rendered as a string.
    pub document_id: &'a str,
    pub receipt_number: &'a str,
    pub line_index: usize,
    pub item_name: &'a str,
    pub requested: i64,
}

/// Stock store seam; [`Database`] is the production implementation.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Atomically deducts one receipt line (clamped at zero, once per
    /// `(document_id, line_index)`).
    async fn deduct_line(&self, line: &LineRequest<'_>) -> Result<LineDeduction, DbError>;
}

#[async_trait]
impl InventoryStore for Database {
    async fn deduct_line(&self, line: &LineRequest<'_>) -> Result<LineDeduction, DbError> {
        self.inventory()
            .deduct_for_receipt(
                line.document_id,
                line.receipt_number,
                line.line_index,
                line.item_name,
                line.requested,
            )
            .await
    }
}

/// What happened to stock for one receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeductionReport {
    pub receipt_number: String,
    pub warnings: Vec<DeductionWarning>,
    pub failures: Vec<DeductionFailure>,
    /// Lines that reduced stock in this run.
    pub applied: usize,
    /// Lines skipped because an earlier run already deducted them.
    pub already_applied: usize,
}

impl DeductionReport {
    fn new(receipt_number: &str) -> Self {
        DeductionReport {
            receipt_number: receipt_number.to_string(),
            ..Default::default()
        }
    }

    pub fn warnings(&self) -> &[DeductionWarning] {
        &self.warnings
    }

    /// Indexes of lines whose store call failed; these are the ones a retry
    /// would pick up.
    pub fn failed_lines(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.line_index).collect()
    }

    /// No warnings and no failures.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.failures.is_empty()
    }
}

/// Best-effort stock deduction over an [`InventoryStore`].
#[derive(Clone)]
pub struct InventoryDeductor {
    store: Arc<dyn InventoryStore>,
}

impl InventoryDeductor {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        InventoryDeductor { store }
    }

    /// Deducts every line of `document`.
    pub async fn deduct(&self, document: &ReceiptDocument) -> DeductionReport {
        let document_id = document.id.to_string();
        let receipt_number = document.receipt_number.as_str();
        let mut report = DeductionReport::new(receipt_number);

        for (index, line) in document.lines.iter().enumerate() {
            let item = &line.item;
            let request = LineRequest {
                document_id: &document_id,
                receipt_number,
                line_index: index,
                item_name: &item.name,
                requested: item.quantity,
            };
            let outcome = self.store.deduct_line(&request).await;

            match outcome {
                Ok(LineDeduction::Applied {
                    available_before,
                    new_quantity,
                    ..
                }) => {
                    report.applied += 1;
                    let plan = plan_deduction(&item.name, item.quantity, available_before);
                    debug!(
                        receipt_number = %receipt_number,
                        item = %item.name,
                        from = available_before,
                        to = new_quantity,
                        "Line deducted"
                    );
                    if let Some(warning) = plan.warning {
                        warn!(receipt_number = %receipt_number, "{}", warning);
                        report.warnings.push(warning);
                    }
                }
                Ok(LineDeduction::NotFound) => {
                    let warning = not_found_warning(&item.name, item.quantity);
                    warn!(receipt_number = %receipt_number, "{}", warning);
                    report.warnings.push(warning);
                }
                Ok(LineDeduction::AlreadyApplied) => {
                    debug!(receipt_number = %receipt_number, line = index, "Line already deducted");
                    report.already_applied += 1;
                }
                Err(e) => {
                    error!(
                        receipt_number = %receipt_number,
                        item = %item.name,
                        error = %e,
                        "Stock update failed"
                    );
                    report.failures.push(DeductionFailure {
                        line_index: index,
                        item_name: item.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            receipt_number = %receipt_number,
            applied = report.applied,
            skipped = report.already_applied,
            warnings = report.warnings.len(),
            failures = report.failures.len(),
            "Inventory deduction finished"
        );

        report
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
