//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate is the **heart** of Tally POS. It prices a basket, builds the
//! receipt document and decides how stock should move, all as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                tally-pos (ReceiptService)                       │   │
//! │  │    PendingItems ──► generate ──► storage / archive / deduct     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  receipt  │  │   money   │  │ deduction │  │  render   │  │   │
//! │  │   │Calculator │  │   Money   │  │   plan    │  │ layout    │  │   │
//! │  │   │ Document  │  │  TaxRate  │  │ warnings  │  │ pdf, text │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │          inventory, receipt log, users, migrations              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, ReceiptDocument, InventoryRecord, ...)
//! - [`money`] - Exact decimal money, VAT and display formatting
//! - [`receipt`] - `ReceiptCalculator`: validation, totals, receipt numbers
//! - [`pending`] - Caller-owned list of items awaiting a receipt
//! - [`deduction`] - Clamp-to-zero stock policy and its warnings
//! - [`render`] - Page layout, PDF bytes and plain-text rendering
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{LineItem, Money, ReceiptCalculator, TaxRate};
//!
//! let calculator = ReceiptCalculator::new(TaxRate::from_bps(750));
//! let lines = vec![
//!     LineItem::new("Ankara", 2, Money::from_major(5000)),
//!     LineItem::new("Lace", 1, Money::from_major(15000)),
//! ];
//!
//! let receipt = calculator.compute("Ada", None, &lines).unwrap();
//! assert_eq!(receipt.subtotal, Money::from_major(25000));
//! assert_eq!(receipt.vat_amount, Money::from_major(1875));
//! assert_eq!(receipt.total, Money::from_major(26875));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod deduction;
pub mod error;
pub mod money;
pub mod pending;
pub mod receipt;
pub mod render;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use deduction::{normalize_item_name, not_found_warning, plan_deduction, DeductionPlan};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{format_currency, Money};
pub use pending::PendingItems;
pub use receipt::ReceiptCalculator;
pub use render::{render_text, Branding, Logo, LogoError, ReceiptLayout};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default VAT rate in basis points (7.5%).
pub const DEFAULT_VAT_RATE_BPS: u32 = 750;

/// Currency prefix printed in front of every amount.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "N";

/// Business name printed in the receipt header.
pub const DEFAULT_COMPANY_NAME: &str = "SEMILOGE TEXTILES";

/// Closing line printed under the totals.
pub const DEFAULT_FOOTER_MESSAGE: &str = "Thank you for your patronage!";

/// Maximum items a clerk can queue for a single receipt.
pub const MAX_PENDING_ITEMS: usize = 100;

/// Role that may read the receipt log and manage accounts.
pub const ROLE_ADMIN: &str = "admin";

/// Role for counter staff.
pub const ROLE_CASHIER: &str = "cashier";
