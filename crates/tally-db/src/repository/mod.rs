//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReceiptService                                                         │
//! │       │                                                                 │
//! │       │  db.inventory().deduct_for_receipt(id, number, 0, "Lace", 2)    │
//! │       ▼                                                                 │
//! │  InventoryRepository                                                    │
//! │  ├── get_by_name(&self, name)                                           │
//! │  ├── update_quantity(&self, id, qty)                                    │
//! │  └── deduct_for_receipt(&self, ...)   ← one transaction per line        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryRepository`](inventory::InventoryRepository) - Stock lookup and deduction
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipt log and lines
//! - [`UserRepository`](user::UserRepository) - Accounts and password checks

use rust_decimal::Decimal;
use std::str::FromStr;
use tally_core::Money;

use crate::error::{DbError, DbResult};

pub mod inventory;
pub mod receipt;
pub mod user;

/// Reads a TEXT money column back into [`Money`].
pub(crate) fn parse_money(column: &str, raw: &str) -> DbResult<Money> {
    Decimal::from_str(raw)
        .map(Money::from_decimal)
        .map_err(|_| DbError::corrupt(column, raw))
}

/// Money as stored in TEXT columns: the exact decimal, no rounding.
pub(crate) fn money_text(amount: Money) -> String {
    amount.amount().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_text_round_trip_keeps_precision() {
        let amount = Money::parse("3333.335", "amount").unwrap();
        let stored = money_text(amount);
        assert_eq!(stored, "3333.335");
        assert_eq!(parse_money("inventory.unit_price", &stored).unwrap(), amount);
    }

    #[test]
    fn test_corrupt_money() {
        let err = parse_money("inventory.unit_price", "five").unwrap_err();
        assert!(matches!(err, DbError::CorruptValue { .. }));
    }
}
