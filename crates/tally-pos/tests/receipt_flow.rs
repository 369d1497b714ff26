//! End-to-end tests for the generate-receipt flow.
//!
//! Real collaborators run against in-memory SQLite and a temp directory;
//! counting and failing fakes cover the error paths.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use chrono::{TimeZone, Utc};
use tally_core::{
    Branding, DeductionReason, LineItem, Money, PendingItems, ReceiptCalculator,
    ReceiptHistoryEntry, TaxRate, UserRecord, ROLE_ADMIN, ROLE_CASHIER,
};
use tally_db::{
    Database, DbConfig, DbError, LineDeduction, NewInventoryItem, NewReceiptHistory,
    NewReceiptLine,
};
use tally_pos::{
    DocumentStorage, InventoryDeductor, InventoryStore, LineRequest, LocalStorage,
    PersistenceStage, PosError, ReceiptArchive, ReceiptService, StorageError,
};
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

fn user(role: &str) -> UserRecord {
    UserRecord {
        id: format!("{}-1", role),
        username: role.to_string(),
        full_name: "Bola Ade".to_string(),
        role: role.to_string(),
    }
}

fn pending(lines: &[(&str, i64, i64)]) -> PendingItems {
    let mut items = PendingItems::new();
    for (name, qty, price) in lines {
        items
            .add(LineItem::new(*name, *qty, Money::from_major(*price)))
            .unwrap();
    }
    items
}

async fn database(stock: &[(&str, i64)]) -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for (name, qty) in stock {
        db.inventory()
            .insert(&NewInventoryItem::new(*name, *qty, Money::from_major(5000)))
            .await
            .unwrap();
    }
    db
}

async fn service_over(db: &Database, dir: &TempDir) -> ReceiptService {
    let storage = LocalStorage::new(dir.path().join("storage"), "http://localhost:8080/files")
        .await
        .unwrap();
    let db = Arc::new(db.clone());
    ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        db.clone(),
        db,
        Arc::new(storage),
    )
}

async fn on_hand(db: &Database, name: &str) -> i64 {
    db.inventory()
        .get_by_name(name)
        .await
        .unwrap()
        .unwrap()
        .quantity_on_hand
}

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
struct Calls {
    archive: AtomicUsize,
    inventory: AtomicUsize,
    storage: AtomicUsize,
}

struct CountingArchive(Arc<Calls>);

#[async_trait]
impl ReceiptArchive for CountingArchive {
    async fn insert_history(&self, _entry: &NewReceiptHistory) -> Result<(), DbError> {
        self.0.archive.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn insert_line(&self, _line: &NewReceiptLine) -> Result<(), DbError> {
        self.0.archive.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_history(&self, _limit: u32) -> Result<Vec<ReceiptHistoryEntry>, DbError> {
        self.0.archive.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

struct CountingStore(Arc<Calls>);

#[async_trait]
impl InventoryStore for CountingStore {
    async fn deduct_line(&self, _line: &LineRequest<'_>) -> Result<LineDeduction, DbError> {
        self.0.inventory.fetch_add(1, Ordering::SeqCst);
        Ok(LineDeduction::NotFound)
    }
}

struct CountingStorage(Arc<Calls>);

#[async_trait]
impl DocumentStorage for CountingStorage {
    async fn upload(&self, key: &str, _data: Vec<u8>) -> Result<String, StorageError> {
        self.0.storage.fetch_add(1, Ordering::SeqCst);
        Ok(format!("memory://{}", key))
    }
}

struct FailingStorage;

#[async_trait]
impl DocumentStorage for FailingStorage {
    async fn upload(&self, _key: &str, _data: Vec<u8>) -> Result<String, StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "bucket unreachable",
        )))
    }
}

struct FailingArchive;

#[async_trait]
impl ReceiptArchive for FailingArchive {
    async fn insert_history(&self, _entry: &NewReceiptHistory) -> Result<(), DbError> {
        Err(DbError::QueryFailed("disk I/O error".into()))
    }

    async fn insert_line(&self, _line: &NewReceiptLine) -> Result<(), DbError> {
        Err(DbError::QueryFailed("disk I/O error".into()))
    }

    async fn list_history(&self, _limit: u32) -> Result<Vec<ReceiptHistoryEntry>, DbError> {
        Ok(Vec::new())
    }
}

/// Delegates to the database, but fails the first call for one item.
struct FlakyStore {
    db: Database,
    flaky_item: &'static str,
    failed_once: Mutex<bool>,
}

#[async_trait]
impl InventoryStore for FlakyStore {
    async fn deduct_line(&self, line: &LineRequest<'_>) -> Result<LineDeduction, DbError> {
        if line.item_name == self.flaky_item {
            let mut failed = self.failed_once.lock().unwrap();
            if !*failed {
                *failed = true;
                return Err(DbError::PoolExhausted);
            }
        }
        self.db.deduct_line(line).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn ada_receipt_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&[("Ankara", 10), ("Lace", 5)]).await;
    let service = service_over(&db, &dir)
        .await
        .with_output_dir(dir.path().join("out"));

    let mut items = pending(&[("Ankara", 2, 5000), ("Lace", 1, 15000)]);
    let outcome = service
        .generate("Ada", Some(&user(ROLE_CASHIER)), &mut items)
        .await
        .unwrap();

    let doc = &outcome.document;
    assert_eq!(doc.subtotal.to_string(), "25000.00");
    assert_eq!(doc.vat_amount.to_string(), "1875.00");
    assert_eq!(doc.total.to_string(), "26875.00");
    assert_eq!(doc.issuer_name.as_deref(), Some("Bola Ade"));
    assert!(items.is_empty());

    // Document artifacts
    assert!(outcome.pdf.starts_with(b"%PDF-1.4"));
    assert_eq!(outcome.file_name, format!("receipt_{}.pdf", doc.receipt_number));
    assert!(outcome.text.contains("N26,875.00"));
    let expected_url = format!(
        "http://localhost:8080/files/receipts/receipt_{}.pdf",
        doc.receipt_number
    );
    assert_eq!(outcome.document_url.as_deref(), Some(expected_url.as_str()));
    assert!(dir
        .path()
        .join("storage/receipts")
        .join(&outcome.file_name)
        .exists());
    assert!(outcome.local_path.as_ref().unwrap().exists());
    assert!(outcome.notices.is_empty());
    assert!(!outcome.has_issues());
    assert!(outcome.success_message().contains("N26,875.00"));

    // Receipt log
    let entry = db
        .receipts()
        .get_history(&doc.receipt_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.customer_name, "Ada");
    assert_eq!(entry.total_amount, doc.total);
    assert_eq!(entry.document_url, outcome.document_url);

    let lines = db.receipts().get_lines(&doc.receipt_number).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item_name, "Ankara");
    assert_eq!(lines[0].line_total, Money::from_major(10000));
    assert_eq!(lines[1].item_name, "Lace");

    // Stock
    assert!(outcome.deduction.is_clean());
    assert_eq!(outcome.deduction.applied, 2);
    assert_eq!(on_hand(&db, "Ankara").await, 8);
    assert_eq!(on_hand(&db, "Lace").await, 4);

    // A second receipt gets its own number.
    let mut again = pending(&[("Ankara", 1, 5000)]);
    let second = service.generate("Ada", None, &mut again).await.unwrap();
    assert!(!second.document.receipt_number.is_empty());
    assert_ne!(second.document.receipt_number, doc.receipt_number);
}

#[tokio::test]
async fn invalid_input_touches_no_collaborator() {
    let calls = Arc::new(Calls::default());
    let service = ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        Arc::new(CountingArchive(calls.clone())),
        Arc::new(CountingStore(calls.clone())),
        Arc::new(CountingStorage(calls.clone())),
    );

    let mut empty = PendingItems::new();
    let err = service.generate("Ada", None, &mut empty).await.unwrap_err();
    assert!(matches!(err, PosError::Validation(_)));

    let mut items = pending(&[("Ankara", 2, 5000)]);
    let err = service.generate("   ", None, &mut items).await.unwrap_err();
    assert!(matches!(err, PosError::Validation(_)));
    assert_eq!(items.len(), 1, "pending items survive a rejected receipt");

    assert_eq!(calls.archive.load(Ordering::SeqCst), 0);
    assert_eq!(calls.inventory.load(Ordering::SeqCst), 0);
    assert_eq!(calls.storage.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fakes_see_one_call_per_step() {
    let calls = Arc::new(Calls::default());
    let service = ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        Arc::new(CountingArchive(calls.clone())),
        Arc::new(CountingStore(calls.clone())),
        Arc::new(CountingStorage(calls.clone())),
    );

    let mut items = pending(&[("Ankara", 2, 5000), ("Lace", 1, 15000)]);
    let outcome = service.generate("Ada", None, &mut items).await.unwrap();

    // header + two lines
    assert_eq!(calls.archive.load(Ordering::SeqCst), 3);
    assert_eq!(calls.inventory.load(Ordering::SeqCst), 2);
    assert_eq!(calls.storage.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.deduction.warnings().len(), 2);
}

#[tokio::test]
async fn oversell_clamps_to_zero_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&[("Lace", 5), ("Ankara", 10)]).await;
    let service = service_over(&db, &dir).await;

    let mut items = pending(&[("lace", 8, 15000), ("Ankara", 3, 5000)]);
    let outcome = service.generate("Ada", None, &mut items).await.unwrap();

    let warnings = outcome.deduction.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].reason, DeductionReason::InsufficientStock);
    assert_eq!(warnings[0].available_qty, 5);
    assert_eq!(warnings[0].requested_qty, 8);

    assert_eq!(on_hand(&db, "Lace").await, 0);
    assert_eq!(on_hand(&db, "Ankara").await, 7);
}

#[tokio::test]
async fn unknown_item_is_reported_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&[("Lace", 5)]).await;
    let service = service_over(&db, &dir).await;

    let mut items = pending(&[("Silk", 1, 8000)]);
    let outcome = service.generate("Ada", None, &mut items).await.unwrap();

    let warnings = outcome.deduction.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].reason, DeductionReason::NotFound);
    assert_eq!(warnings[0].item_name, "Silk");

    assert!(db.inventory().get_by_name("Silk").await.unwrap().is_none());
    assert_eq!(db.inventory().count().await.unwrap(), 1);
    assert_eq!(on_hand(&db, "Lace").await, 5);
}

#[tokio::test]
async fn storage_failure_is_a_notice() {
    let db = database(&[("Ankara", 10)]).await;
    let shared = Arc::new(db.clone());
    let service = ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        shared.clone(),
        shared,
        Arc::new(FailingStorage),
    );

    let mut items = pending(&[("Ankara", 2, 5000)]);
    let outcome = service.generate("Ada", None, &mut items).await.unwrap();

    assert!(!outcome.pdf.is_empty());
    assert!(outcome.document_url.is_none());
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].stage, PersistenceStage::CloudCopy);
    assert!(outcome.issues()[0].starts_with("could not save cloud copy"));

    // Logging and deduction still happen.
    let entry = db
        .receipts()
        .get_history(&outcome.document.receipt_number)
        .await
        .unwrap()
        .unwrap();
    assert!(entry.document_url.is_none());
    assert_eq!(on_hand(&db, "Ankara").await, 8);
}

#[tokio::test]
async fn log_failure_is_a_notice() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&[("Ankara", 10)]).await;
    let storage = LocalStorage::new(dir.path(), "http://localhost/files")
        .await
        .unwrap();
    let service = ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        Arc::new(FailingArchive),
        Arc::new(db.clone()),
        Arc::new(storage),
    );

    let mut items = pending(&[("Ankara", 2, 5000)]);
    let outcome = service.generate("Ada", None, &mut items).await.unwrap();

    assert!(outcome
        .notices
        .iter()
        .all(|n| n.stage == PersistenceStage::History));
    // header + one line
    assert_eq!(outcome.notices.len(), 2);
    assert!(outcome.document_url.is_some());
    assert_eq!(on_hand(&db, "Ankara").await, 8);
}

#[tokio::test]
async fn retry_only_applies_failed_lines() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&[("Ankara", 10), ("Lace", 5)]).await;
    let storage = LocalStorage::new(dir.path(), "http://localhost/files")
        .await
        .unwrap();
    let service = ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        Arc::new(db.clone()),
        Arc::new(FlakyStore {
            db: db.clone(),
            flaky_item: "Lace",
            failed_once: Mutex::new(false),
        }),
        Arc::new(storage),
    );

    let mut items = pending(&[("Ankara", 2, 5000), ("Lace", 1, 15000)]);
    let outcome = service.generate("Ada", None, &mut items).await.unwrap();

    assert_eq!(outcome.deduction.failed_lines(), vec![1]);
    assert_eq!(outcome.deduction.failures[0].item_name, "Lace");
    assert_eq!(on_hand(&db, "Ankara").await, 8);
    assert_eq!(on_hand(&db, "Lace").await, 5);

    let retry = service.retry_deduction(&outcome.document).await;
    assert_eq!(retry.already_applied, 1);
    assert_eq!(retry.applied, 1);
    assert!(retry.is_clean());
    assert_eq!(on_hand(&db, "Ankara").await, 8);
    assert_eq!(on_hand(&db, "Lace").await, 4);

    let again = service.retry_deduction(&outcome.document).await;
    assert_eq!(again.already_applied, 2);
    assert_eq!(again.applied, 0);
    assert_eq!(on_hand(&db, "Lace").await, 4);
}

#[tokio::test]
async fn same_receipt_number_on_two_tills_deducts_twice() {
    let db = database(&[("Lace", 10)]).await;
    let deductor = InventoryDeductor::new(Arc::new(db.clone()));
    let at = Utc.with_ymd_and_hms(2026, 10, 18, 14, 30, 5).unwrap();
    let lines = [LineItem::new("Lace", 2, Money::from_major(15000))];

    // Each till has its own calculator.
    let first = ReceiptCalculator::new(TaxRate::from_bps(750))
        .compute_at("Ada", None, &lines, at)
        .unwrap();
    let second = ReceiptCalculator::new(TaxRate::from_bps(750))
        .compute_at("Bola", None, &lines, at)
        .unwrap();
    assert_eq!(first.receipt_number, second.receipt_number);

    let report = deductor.deduct(&first).await;
    assert_eq!(report.applied, 1);
    let report = deductor.deduct(&second).await;
    assert_eq!(report.applied, 1);
    assert_eq!(report.already_applied, 0);

    assert_eq!(on_hand(&db, "Lace").await, 6);
}

#[tokio::test]
async fn oversized_amounts_are_rejected_before_any_io() {
    let calls = Arc::new(Calls::default());
    let service = ReceiptService::new(
        TaxRate::from_bps(750),
        Branding::default(),
        Arc::new(CountingArchive(calls.clone())),
        Arc::new(CountingStore(calls.clone())),
        Arc::new(CountingStorage(calls.clone())),
    );

    let mut items = PendingItems::new();
    items
        .add(LineItem::new(
            "Bulk",
            10_000_000_000,
            Money::parse("10000000000000000000", "unit_price").unwrap(),
        ))
        .unwrap();
    assert_eq!(items.preview_subtotal(), None);

    let err = service.generate("Ada", None, &mut items).await.unwrap_err();
    match err {
        PosError::Validation(e) => assert_eq!(e.field(), "lines[0].quantity"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(items.len(), 1);
    assert_eq!(calls.archive.load(Ordering::SeqCst), 0);
    assert_eq!(calls.inventory.load(Ordering::SeqCst), 0);
    assert_eq!(calls.storage.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn history_is_admin_only() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&[]).await;
    let service = service_over(&db, &dir).await;

    let mut items = pending(&[("Ankara", 2, 5000)]);
    service.generate("Ada", None, &mut items).await.unwrap();

    assert!(matches!(
        service.receipt_history(&user(ROLE_CASHIER), 10).await,
        Err(PosError::Forbidden { .. })
    ));

    let history = service.receipt_history(&user(ROLE_ADMIN), 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].customer_name, "Ada");
}
