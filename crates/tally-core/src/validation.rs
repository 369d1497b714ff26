//! # Validation Module
//!
//! Input rules for receipts, line items and accounts.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: PendingItems::add                                            │
//! │  └── rejects a bad line before it is queued                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: ReceiptCalculator::compute                                   │
//! │  └── re-checks customer + every line (callers may skip layer 1)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names in errors are prefixed by the caller, so the same line check
//! reports `quantity` from the pending list and `lines[2].quantity` from a
//! receipt computation.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::LineItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest customer or item name we print.
pub const MAX_NAME_LEN: usize = 120;

/// Highest VAT rate accepted from configuration (100%).
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

fn field_name(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates the customer name and returns it trimmed.
///
/// ```rust
/// use tally_core::validation::validate_customer_name;
///
/// assert_eq!(validate_customer_name("  Ada ").unwrap(), "Ada");
/// assert!(validate_customer_name("   ").is_err());
/// ```
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    validate_name("customer_name", name)
}

/// Validates a non-empty, bounded display name for `field`.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a login name: non-empty, no whitespace, at most 64 chars.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 64,
        });
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Passwords must be at least 8 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::OutOfRange {
            field: "password length".to_string(),
            min: 8,
            max: 1024,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity must be a positive integer.
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Unit price must be zero or greater (free items are allowed).
pub fn validate_unit_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_TAX_RATE_BPS {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate_bps".to_string(),
            min: 0,
            max: i64::from(MAX_TAX_RATE_BPS),
        });
    }
    Ok(())
}

// =============================================================================
// Line Validators
// =============================================================================

/// Checks one line. `prefix` is prepended to field names (`lines[0]`).
pub fn validate_line(prefix: &str, line: &LineItem) -> ValidationResult<()> {
    validate_name(&field_name(prefix, "name"), &line.name)?;
    validate_quantity(&field_name(prefix, "quantity"), line.quantity)?;
    validate_unit_price(&field_name(prefix, "unit_price"), line.unit_price)?;
    Ok(())
}

/// Checks a whole receipt body: at least one line, every line valid.
///
/// ```rust
/// use tally_core::{validation::validate_lines, LineItem, Money};
///
/// let lines = vec![
///     LineItem::new("Ankara", 2, Money::from_major(5000)),
///     LineItem::new("Lace", 0, Money::from_major(15000)),
/// ];
/// let err = validate_lines(&lines).unwrap_err();
/// assert_eq!(err.field(), "lines[1].quantity");
/// ```
pub fn validate_lines(lines: &[LineItem]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }

    for (index, line) in lines.iter().enumerate() {
        validate_line(&format!("lines[{}]", index), line)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
