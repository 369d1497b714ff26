//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tally-pos errors (service layer)                                      │
//! │  └── PosError         - What the caller of ReceiptService sees         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PosError → caller                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock shortfalls are NOT errors here: they are reported as
//! [`DeductionWarning`](crate::types::DeductionWarning) values.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The pending list is full.
    #[error("Cannot queue more than {max} items for one receipt")]
    TooManyItems { max: usize },

    /// Index does not point at a pending item.
    #[error("No pending item at position {index} (have {len})")]
    ItemIndexOutOfRange { index: usize, len: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Every variant names the offending field. Line fields are indexed,
/// e.g. `lines[1].quantity`, so a caller can point at the bad row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// A list that must hold at least one entry is empty.
    #[error("{field} must contain at least one item")]
    Empty { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Amounts too large to total without overflowing.
    #[error("{field} is too large to total")]
    TooLarge { field: String },

    /// Invalid format (e.g. unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Returns the name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::Empty { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::TooLarge { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer_name".to_string(),
        };
        assert_eq!(err.to_string(), "customer_name is required");

        let err = ValidationError::MustBePositive {
            field: "lines[1].quantity".to_string(),
        };
        assert_eq!(err.to_string(), "lines[1].quantity must be positive");

        let err = ValidationError::Empty {
            field: "lines".to_string(),
        };
        assert_eq!(err.to_string(), "lines must contain at least one item");
    }

    #[test]
    fn test_field_accessor() {
        let err = ValidationError::MustNotBeNegative {
            field: "lines[0].unit_price".to_string(),
        };
        assert_eq!(err.field(), "lines[0].unit_price");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
