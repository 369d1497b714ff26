//! # Deduction Policy
//!
//! Decides what happens to stock when a receipt line is sold.
//!
//! ## Clamp-to-Zero Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  available   requested   new quantity   warning                         │
//! │  ─────────   ─────────   ────────────   ───────                         │
//! │      10          3             7         none                           │
//! │       5          5             0         none                           │
//! │       5          8             0         INSUFFICIENT_STOCK (5 / 8)     │
//! │   (no record)    2             -         NOT_FOUND                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock never goes negative and the sale is never blocked. The store
//! applies the same rule atomically; these functions build the warnings
//! from its result.

use crate::types::{DeductionReason, DeductionWarning};

/// Canonical inventory key for an item name: trimmed and lowercased.
///
/// ```rust
/// use tally_core::normalize_item_name;
/// assert_eq!(normalize_item_name("  Guinea Brocade "), "guinea brocade");
/// ```
pub fn normalize_item_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Outcome of applying a sale to a known stock level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionPlan {
    /// Quantity to write back (never negative).
    pub new_quantity: i64,
    /// Units actually taken off the shelf.
    pub deducted: i64,
    /// Present when the request exceeded what was on hand.
    pub warning: Option<DeductionWarning>,
}

/// Plans a deduction of `requested` units from `available`.
///
/// ```rust
/// use tally_core::plan_deduction;
///
/// let plan = plan_deduction("Lace", 8, 5);
/// assert_eq!(plan.new_quantity, 0);
/// assert!(plan.warning.is_some());
/// ```
pub fn plan_deduction(item_name: &str, requested: i64, available: i64) -> DeductionPlan {
    let on_hand = available.max(0);
    let new_quantity = (on_hand - requested).max(0);

    let warning = if requested > on_hand {
        Some(DeductionWarning {
            item_name: item_name.to_string(),
            reason: DeductionReason::InsufficientStock,
            requested_qty: requested,
            available_qty: available,
        })
    } else {
        None
    };

    DeductionPlan {
        new_quantity,
        deducted: on_hand - new_quantity,
        warning,
    }
}

/// Warning for a line whose item has no inventory record.
pub fn not_found_warning(item_name: &str, requested: i64) -> DeductionWarning {
    DeductionWarning {
        item_name: item_name.to_string(),
        reason: DeductionReason::NotFound,
        requested_qty: requested,
        available_qty: 0,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
