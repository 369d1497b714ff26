//! # Service Error Types
//!
//! Errors and non-fatal notices for the receipt service.
//!
//! ## What Fails, What Doesn't
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   generate() outcome by failure kind                    │
//! │                                                                         │
//! │  ValidationError ─────────────► Err(PosError::Validation)              │
//! │                                  (nothing written, nothing deducted)    │
//! │                                                                         │
//! │  local copy / upload / log ───► Ok(outcome) + PersistenceNotice        │
//! │  store call on one line ──────► Ok(outcome) + DeductionFailure         │
//! │  short stock / unknown item ──► Ok(outcome) + DeductionWarning         │
//! │                                                                         │
//! │  bad login ───────────────────► Err(PosError::AuthenticationFailed)    │
//! │  wrong role ──────────────────► Err(PosError::Forbidden)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;
use tally_core::{CoreError, ValidationError};
use tally_db::DbError;
use thiserror::Error;

use crate::storage::StorageError;

/// Result type alias for service operations.
pub type PosResult<T> = Result<T, PosError>;

/// Errors returned by [`ReceiptService`](crate::ReceiptService) and
/// [`AuthService`](crate::AuthService).
#[derive(Debug, Error)]
pub enum PosError {
    /// Input rejected before any collaborator was called.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Pending-list operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database call failed outside the best-effort steps.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Document storage failed outside the best-effort steps.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Unknown user, wrong password or deactivated account.
    #[error("Invalid username or password")]
    AuthenticationFailed,

    /// The user's role does not allow this action.
    #[error("Role '{role}' may not {action}")]
    Forbidden { role: String, action: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Non-fatal Outcomes
// =============================================================================

/// Which best-effort write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceStage {
    LocalCopy,
    CloudCopy,
    History,
}

impl fmt::Display for PersistenceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceStage::LocalCopy => write!(f, "could not save local copy"),
            PersistenceStage::CloudCopy => write!(f, "could not save cloud copy"),
            PersistenceStage::History => write!(f, "could not log receipt"),
        }
    }
}

/// A persistence failure reported alongside a successful receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceNotice {
    pub stage: PersistenceStage,
    pub message: String,
}

impl PersistenceNotice {
    pub fn new(stage: PersistenceStage, error: impl fmt::Display) -> Self {
        PersistenceNotice {
            stage,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for PersistenceNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// A receipt line whose stock call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionFailure {
    pub line_index: usize,
    pub item_name: String,
    pub message: String,
}

impl fmt::Display for DeductionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Could not update stock for '{}' (line {}): {}",
            self.item_name,
            self.line_index + 1,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_message() {
        let notice = PersistenceNotice::new(PersistenceStage::CloudCopy, "disk full");
        assert_eq!(notice.to_string(), "could not save cloud copy: disk full");
    }

    #[test]
    fn test_validation_is_transparent() {
        let err: PosError = ValidationError::Empty {
            field: "lines".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            ValidationError::Empty {
                field: "lines".into()
            }
            .to_string()
        );
    }

    #[test]
    fn test_forbidden_message() {
        let err = PosError::Forbidden {
            role: "cashier".into(),
            action: "view receipt history".into(),
        };
        assert_eq!(err.to_string(), "Role 'cashier' may not view receipt history");
    }
}
