//! # Receipt Service
//!
//! The "generate receipt" action end to end.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate(customer, issuer, &mut pending)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. ReceiptCalculator::compute ──── invalid ──► Err(Validation)        │
//! │       │                              (pending untouched, no I/O)        │
//! │       ▼                                                                 │
//! │  2. pending.clear()                                                    │
//! │       ▼                                                                 │
//! │  3. ReceiptLayout → PDF bytes, render_text → console text              │
//! │       ▼                                                                 │
//! │  4. local copy ─┐                                                      │
//! │     upload ─────┼── each failure → PersistenceNotice                   │
//! │     log + lines ┘                                                      │
//! │       ▼                                                                 │
//! │  5. InventoryDeductor::deduct → DeductionReport                        │
//! │       ▼                                                                 │
//! │  Ok(ReceiptOutcome)                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every collaborator call is awaited in turn; nothing runs in parallel.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_core::{
    format_currency, render_text, Branding, Logo, PendingItems, ReceiptCalculator,
    ReceiptDocument, ReceiptHistoryEntry, ReceiptLayout, TaxRate, UserRecord, ROLE_ADMIN,
};
use tally_db::Database;
use tracing::{debug, info, warn};

use crate::archive::{history_entry, line_entries, ReceiptArchive};
use crate::auth::require_role;
use crate::config::PosConfig;
use crate::error::{PersistenceNotice, PersistenceStage, PosResult};
use crate::inventory::{DeductionReport, InventoryDeductor, InventoryStore};
use crate::storage::{write_local_copy, DocumentStorage, LocalStorage};

/// Everything the caller gets back from [`ReceiptService::generate`].
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptOutcome {
    pub document: ReceiptDocument,
    /// `receipt_<number>.pdf`
    pub file_name: String,
    /// The download artifact.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// Plain-text rendition of the same receipt.
    pub text: String,
    /// Public URL of the stored copy, when the upload succeeded.
    pub document_url: Option<String>,
    /// Where the local copy was written, if one was requested and succeeded.
    pub local_path: Option<PathBuf>,
    pub notices: Vec<PersistenceNotice>,
    pub deduction: DeductionReport,
    #[serde(skip)]
    currency_symbol: String,
}

impl ReceiptOutcome {
    /// Shown to the clerk for every valid receipt, whatever else went wrong.
    pub fn success_message(&self) -> String {
        format!(
            "Receipt {} generated for {} ({}). Total: {}",
            self.document.receipt_number,
            self.document.customer_name,
            self.file_name,
            format_currency(self.document.total, &self.currency_symbol)
        )
    }

    /// Persistence notices, deduction warnings and failures as display lines.
    pub fn issues(&self) -> Vec<String> {
        self.notices
            .iter()
            .map(ToString::to_string)
            .chain(self.deduction.warnings().iter().map(ToString::to_string))
            .chain(self.deduction.failures.iter().map(ToString::to_string))
            .collect()
    }

    pub fn has_issues(&self) -> bool {
        !self.notices.is_empty() || !self.deduction.is_clean()
    }
}

/// Orchestrates compute, render, persist and deduct.
pub struct ReceiptService {
    calculator: ReceiptCalculator,
    branding: Branding,
    archive: Arc<dyn ReceiptArchive>,
    deductor: InventoryDeductor,
    storage: Arc<dyn DocumentStorage>,
    output_dir: Option<PathBuf>,
}

impl ReceiptService {
    pub fn new(
        vat_rate: TaxRate,
        branding: Branding,
        archive: Arc<dyn ReceiptArchive>,
        inventory: Arc<dyn InventoryStore>,
        storage: Arc<dyn DocumentStorage>,
    ) -> Self {
        ReceiptService {
            calculator: ReceiptCalculator::new(vat_rate),
            branding,
            archive,
            deductor: InventoryDeductor::new(inventory),
            storage,
            output_dir: None,
        }
    }

    /// Also write each PDF into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Wires the service to a database and [`LocalStorage`] per `config`.
    pub async fn from_config(config: &PosConfig, db: &Database) -> PosResult<Self> {
        let mut branding = config.branding();
        if let Some(path) = &config.store.logo_path {
            if let Some(logo) = load_logo(path).await {
                branding = branding.with_logo(logo);
            }
        }

        let storage =
            LocalStorage::new(&config.storage.root, &config.storage.public_base_url).await?;
        let db = Arc::new(db.clone());

        let mut service = ReceiptService::new(
            config.vat_rate(),
            branding,
            db.clone(),
            db,
            Arc::new(storage),
        );
        service.output_dir = config.storage.output_dir.clone();
        Ok(service)
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    pub fn vat_rate(&self) -> TaxRate {
        self.calculator.vat_rate()
    }

    /// Issues a receipt for the pending items.
    ///
    /// ## Errors
    /// Only validation errors. Once the document is computed the call
    /// succeeds; later problems are reported inside the outcome.
    pub async fn generate(
        &self,
        customer_name: &str,
        issuer: Option<&UserRecord>,
        pending: &mut PendingItems,
    ) -> PosResult<ReceiptOutcome> {
        let issuer_name = issuer.map(|user| user.full_name.as_str());
        let document = self
            .calculator
            .compute(customer_name, issuer_name, pending.items())?;
        pending.clear();

        let receipt_number = document.receipt_number.clone();
        debug!(
            receipt_number = %receipt_number,
            lines = document.item_count(),
            total = %document.total,
            "Receipt computed"
        );

        let pdf = ReceiptLayout::build(&document, &self.branding).to_pdf();
        let text = render_text(&document, &self.branding);
        let file_name = document.file_name();

        let mut notices = Vec::new();

        let local_path = match &self.output_dir {
            Some(dir) => match write_local_copy(dir, &file_name, &pdf).await {
                Ok(path) => Some(path),
                Err(e) => {
                    notices.push(self.notice(&receipt_number, PersistenceStage::LocalCopy, e));
                    None
                }
            },
            None => None,
        };

        let document_url = match self.storage.upload(&document.storage_key(), pdf.clone()).await {
            Ok(url) => Some(url),
            Err(e) => {
                notices.push(self.notice(&receipt_number, PersistenceStage::CloudCopy, e));
                None
            }
        };

        let header = history_entry(&document, document_url.clone());
        if let Err(e) = self.archive.insert_history(&header).await {
            notices.push(self.notice(&receipt_number, PersistenceStage::History, e));
        }
        for line in line_entries(&document) {
            if let Err(e) = self.archive.insert_line(&line).await {
                notices.push(self.notice(&receipt_number, PersistenceStage::History, e));
            }
        }

        let deduction = self.deductor.deduct(&document).await;

        info!(
            receipt_number = %receipt_number,
            customer = %document.customer_name,
            total = %document.total,
            notices = notices.len(),
            warnings = deduction.warnings().len(),
            "Receipt generated"
        );

        Ok(ReceiptOutcome {
            document,
            file_name,
            pdf,
            text,
            document_url,
            local_path,
            notices,
            deduction,
            currency_symbol: self.branding.currency_symbol.clone(),
        })
    }

    /// Re-runs stock deduction for an issued receipt.
    ///
    /// Lines that already reduced stock are skipped, so only lines that
    /// failed before are applied.
    pub async fn retry_deduction(&self, document: &ReceiptDocument) -> DeductionReport {
        info!(receipt_number = %document.receipt_number, "Retrying inventory deduction");
        self.deductor.deduct(document).await
    }

    /// Most recent receipts first. Admin only.
    pub async fn receipt_history(
        &self,
        user: &UserRecord,
        limit: u32,
    ) -> PosResult<Vec<ReceiptHistoryEntry>> {
        require_role(user, &[ROLE_ADMIN], "view receipt history")?;
        Ok(self.archive.list_history(limit).await?)
    }

    fn notice(
        &self,
        receipt_number: &str,
        stage: PersistenceStage,
        error: impl std::fmt::Display,
    ) -> PersistenceNotice {
        let notice = PersistenceNotice::new(stage, error);
        warn!(receipt_number = %receipt_number, "{}", notice);
        notice
    }
}

/// Reads the logo PNG. A missing file is skipped quietly; anything else that
/// stops it loading is logged and skipped.
pub async fn load_logo(path: &Path) -> Option<Logo> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No logo file");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read logo");
            return None;
        }
    };

    match Logo::from_png(&bytes) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unsupported logo, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{LineItem, Money};

    #[tokio::test]
    async fn test_missing_logo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_logo(&dir.path().join("logo.png")).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_logo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"GIF89a").unwrap();
        assert!(load_logo(&path).await.is_none());
    }

    #[tokio::test]
    async fn test_rgba_logo_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");

        let mut image = image::RgbaImage::from_pixel(66, 24, image::Rgba([10, 60, 120, 255]));
        image.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        image.save(&path).unwrap();

        let logo = load_logo(&path).await.unwrap();
        assert_eq!(logo.width(), 66);
        assert_eq!(logo.height(), 24);
        assert!(logo.alpha_data().is_some());

        let branding = Branding::default().with_logo(logo);
        let lines = [LineItem::new("Lace", 1, Money::from_major(15000))];
        let document = ReceiptCalculator::new(TaxRate::from_bps(750))
            .compute("Ada", None, &lines)
            .unwrap();
        let pdf = ReceiptLayout::build(&document, &branding).to_pdf();
        assert!(pdf.windows(7).any(|w| w == b"/SMask "));
    }
}
