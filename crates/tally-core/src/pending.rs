//! # Pending Items
//!
//! The list of lines a clerk has keyed in but not yet turned into a receipt.
//!
//! The list is an explicit value owned by the caller (one per counter
//! session); nothing in this crate keeps it globally.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Clerk Action            PendingItems               State Change        │
//! │  ────────────            ────────────               ────────────        │
//! │  Add item ─────────────► add(line) ───────────────► items.push(line)   │
//! │  Remove row ───────────► remove(i) ───────────────► items.remove(i)    │
//! │  Start over ───────────► clear() ─────────────────► items.clear()      │
//! │  Generate receipt ─────► items() → compute → clear()                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::LineItem;
use crate::validation::validate_line;
use crate::MAX_PENDING_ITEMS;

/// Ordered, caller-owned list of queued line items.
///
/// ## Invariants
/// - Insertion order is receipt order
/// - Every queued line passed [`validate_line`]
/// - At most [`MAX_PENDING_ITEMS`] lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItems {
    items: Vec<LineItem>,
}

impl PendingItems {
    pub fn new() -> Self {
        PendingItems::default()
    }

    /// Validates and appends a line. Names are stored trimmed.
    ///
    /// ```rust
    /// use tally_core::{LineItem, Money, PendingItems};
    ///
    /// let mut pending = PendingItems::new();
    /// pending.add(LineItem::new("Ankara", 2, Money::from_major(5000))).unwrap();
    /// assert!(pending.add(LineItem::new("Lace", 0, Money::from_major(1))).is_err());
    /// assert_eq!(pending.len(), 1);
    /// ```
    pub fn add(&mut self, line: LineItem) -> CoreResult<()> {
        if self.items.len() >= MAX_PENDING_ITEMS {
            return Err(CoreError::TooManyItems {
                max: MAX_PENDING_ITEMS,
            });
        }

        validate_line("", &line)?;

        self.items.push(LineItem {
            name: line.name.trim().to_string(),
            ..line
        });
        Ok(())
    }

    /// Removes and returns the line at `index`.
    pub fn remove(&mut self, index: usize) -> CoreResult<LineItem> {
        if index >= self.items.len() {
            return Err(CoreError::ItemIndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Running subtotal before VAT, for the "Items Purchased" preview.
    ///
    /// `None` once the queued amounts no longer fit in a decimal.
    pub fn preview_subtotal(&self) -> Option<Money> {
        self.items
            .iter()
            .map(LineItem::line_total)
            .try_fold(Money::zero(), |total, line| total.checked_add(line?))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, qty: i64, price: i64) -> LineItem {
        LineItem::new(name, qty, Money::from_major(price))
    }

    #[test]
    fn test_add_preserves_order() {
        let mut pending = PendingItems::new();
        pending.add(line("Ankara", 2, 5000)).unwrap();
        pending.add(line(" Lace ", 1, 15000)).unwrap();

        let names: Vec<&str> = pending.items().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Ankara", "Lace"]);
        assert_eq!(pending.preview_subtotal(), Some(Money::from_major(25000)));
    }

    #[test]
    fn test_add_rejects_invalid() {
        let mut pending = PendingItems::new();

        let err = pending.add(line("", 1, 10)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        assert!(pending.add(line("Lace", -1, 10)).is_err());
        assert!(pending.add(line("Lace", 1, -10)).is_err());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_capacity() {
        let mut pending = PendingItems::new();
        for i in 0..MAX_PENDING_ITEMS {
            pending.add(line(&format!("Item {}", i), 1, 1)).unwrap();
        }

        let err = pending.add(line("One more", 1, 1)).unwrap_err();
        assert!(matches!(err, CoreError::TooManyItems { .. }));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut pending = PendingItems::new();
        pending.add(line("Ankara", 2, 5000)).unwrap();
        pending.add(line("Lace", 1, 15000)).unwrap();

        let removed = pending.remove(0).unwrap();
        assert_eq!(removed.name, "Ankara");
        assert!(matches!(
            pending.remove(5),
            Err(CoreError::ItemIndexOutOfRange { index: 5, len: 1 })
        ));

        pending.clear();
        assert!(pending.is_empty());
    }
}
