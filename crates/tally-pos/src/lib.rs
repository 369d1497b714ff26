//! # tally-pos: Receipt Service for Tally POS
//!
//! Wires the pure core to the database and document storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  `tally generate --order order.json`                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-pos (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │  AuthService ──► ReceiptService ──┬──► DocumentStorage          │   │
//! │  │                      │            ├──► ReceiptArchive           │   │
//! │  │                      │            └──► InventoryDeductor        │   │
//! │  │                      ▼                       │                  │   │
//! │  │               tally-core (compute, render)   ▼                  │   │
//! │  │                                        InventoryStore           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tally-db (SQLite)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`service`] - The generate-receipt flow
//! - [`inventory`] - Best-effort stock deduction and its report
//! - [`archive`] - Receipt log seam
//! - [`storage`] - Document storage seam and [`LocalStorage`]
//! - [`auth`] - Login and role checks
//! - [`config`] - `tally.toml` + environment
//! - [`telemetry`] - Tracing setup

pub mod archive;
pub mod auth;
pub mod config;
pub mod error;
pub mod inventory;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use archive::ReceiptArchive;
pub use auth::{require_role, AuthService};
pub use config::PosConfig;
pub use error::{
    ConfigError, DeductionFailure, PersistenceNotice, PersistenceStage, PosError, PosResult,
};
pub use inventory::{DeductionReport, InventoryDeductor, InventoryStore, LineRequest};
pub use service::{ReceiptOutcome, ReceiptService};
pub use storage::{DocumentStorage, LocalStorage, StorageError};
