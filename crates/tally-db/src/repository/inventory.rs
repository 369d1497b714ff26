//! # Inventory Repository
//!
//! Stock records and the per-line deduction used when a receipt is issued.
//!
//! ## Atomic Decrement-With-Floor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deduct_for_receipt(doc 9f3c…, "2026…123", line 1, "Lace", 8)           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   UPDATE inventory                                                      │
//! │      SET quantity_on_hand = MAX(quantity_on_hand - 8, 0),              │
//! │          last_deducted    = MIN(quantity_on_hand, 8)   ← old value      │
//! │    WHERE item_key = 'lace'                                              │
//! │      AND (document_id, line) not yet in inventory_applications          │
//! │   RETURNING quantity_on_hand, last_deducted                             │
//! │       │                                                                 │
//! │       ├── row  → INSERT inventory_applications, COMMIT  → Applied       │
//! │       └── none → ledger hit? AlreadyApplied : NotFound,  ROLLBACK       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The first statement is a write, so the check and the decrement happen
//! under SQLite's single writer lock; no read-modify-write window exists.
//! `available_before = quantity_on_hand + last_deducted`.

use chrono::Utc;
use sqlx::SqlitePool;
use tally_core::{normalize_item_name, InventoryRecord, Money};
use tracing::{debug, info};
use uuid::Uuid;

use super::{money_text, parse_money};
use crate::error::{DbError, DbResult};

/// Input for a new stock record.
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub item_name: String,
    pub quantity_on_hand: i64,
    pub unit_price: Money,
    pub cost_price: Option<Money>,
    pub category: Option<String>,
}

impl NewInventoryItem {
    pub fn new(item_name: impl Into<String>, quantity_on_hand: i64, unit_price: Money) -> Self {
        NewInventoryItem {
            item_name: item_name.into(),
            quantity_on_hand,
            unit_price,
            cost_price: None,
            category: None,
        }
    }

    pub fn with_cost_price(mut self, cost_price: Money) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Result of deducting one receipt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDeduction {
    /// Stock was reduced (possibly clamped at zero).
    Applied {
        inventory_id: String,
        item_name: String,
        available_before: i64,
        new_quantity: i64,
    },
    /// No record matches the item name; nothing changed.
    NotFound,
    /// This receipt line was deducted by an earlier call; nothing changed.
    AlreadyApplied,
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: String,
    item_name: String,
    quantity_on_hand: i64,
    unit_price: String,
    cost_price: Option<String>,
    category: Option<String>,
}

impl TryFrom<InventoryRow> for InventoryRecord {
    type Error = DbError;

    fn try_from(row: InventoryRow) -> DbResult<Self> {
        Ok(InventoryRecord {
            unit_price: parse_money("inventory.unit_price", &row.unit_price)?,
            cost_price: row
                .cost_price
                .as_deref()
                .map(|raw| parse_money("inventory.cost_price", raw))
                .transpose()?,
            id: row.id,
            item_name: row.item_name,
            quantity_on_hand: row.quantity_on_hand,
            category: row.category,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeductedRow {
    id: String,
    item_name: String,
    quantity_on_hand: i64,
    last_deducted: i64,
}

const SELECT_COLUMNS: &str =
    "SELECT id, item_name, quantity_on_hand, unit_price, cost_price, category FROM inventory";

/// Repository for stock records.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Adds a stock record.
    ///
    /// ## Errors
    /// - `InvalidInput` for a blank name or negative quantity
    /// - `UniqueViolation` when the normalized name already exists
    pub async fn insert(&self, item: &NewInventoryItem) -> DbResult<InventoryRecord> {
        let item_name = item.item_name.trim();
        if item_name.is_empty() {
            return Err(DbError::InvalidInput("item_name is required".into()));
        }
        if item.quantity_on_hand < 0 {
            return Err(DbError::InvalidInput(
                "quantity_on_hand must not be negative".into(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let key = normalize_item_name(item_name);
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO inventory
                (id, item_name, item_key, quantity_on_hand, unit_price, cost_price, category, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&id)
        .bind(item_name)
        .bind(&key)
        .bind(item.quantity_on_hand)
        .bind(money_text(item.unit_price))
        .bind(item.cost_price.map(money_text))
        .bind(&item.category)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item_name),
            other => other,
        })?;

        debug!(id = %id, item = %item_name, qty = item.quantity_on_hand, "Inventory item created");

        Ok(InventoryRecord {
            id,
            item_name: item_name.to_string(),
            quantity_on_hand: item.quantity_on_hand,
            unit_price: item.unit_price,
            cost_price: item.cost_price,
            category: item.category.clone(),
        })
    }

    /// Looks up a record by item name (case-insensitive, trimmed).
    pub async fn get_by_name(&self, item_name: &str) -> DbResult<Option<InventoryRecord>> {
        let key = normalize_item_name(item_name);

        let query = format!("{} WHERE item_key = ?1", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, InventoryRow>(&query)
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(InventoryRecord::try_from).transpose()
    }

    /// Lists records by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "{} ORDER BY item_key LIMIT ?1",
            SELECT_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InventoryRecord::try_from).collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Overwrites the on-hand quantity of a record.
    ///
    /// Administrative correction; receipts go through
    /// [`deduct_for_receipt`](Self::deduct_for_receipt).
    pub async fn update_quantity(&self, id: &str, new_quantity: i64) -> DbResult<()> {
        if new_quantity < 0 {
            return Err(DbError::InvalidInput(
                "quantity_on_hand must not be negative".into(),
            ));
        }

        let result = sqlx::query(
            "UPDATE inventory SET quantity_on_hand = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(new_quantity)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", id));
        }

        debug!(id = %id, qty = new_quantity, "Inventory quantity set");
        Ok(())
    }

    /// Adds `delta` units to a record found by name.
    pub async fn restock(&self, item_name: &str, delta: i64) -> DbResult<InventoryRecord> {
        if delta <= 0 {
            return Err(DbError::InvalidInput("restock delta must be positive".into()));
        }

        let result = sqlx::query(
            "UPDATE inventory SET quantity_on_hand = quantity_on_hand + ?1, updated_at = ?2 WHERE item_key = ?3",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(normalize_item_name(item_name))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory item", item_name));
        }

        info!(item = %item_name, delta = delta, "Inventory restocked");
        self.get_by_name(item_name)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory item", item_name))
    }

    /// Deducts one receipt line, at most once per `(document_id, line_index)`.
    ///
    /// `receipt_number` is recorded for reference only; it is not unique
    /// across tills. Stock is clamped at zero. The caller turns the returned
    /// `available_before` into a shortfall warning.
    pub async fn deduct_for_receipt(
        &self,
        document_id: &str,
        receipt_number: &str,
        line_index: usize,
        item_name: &str,
        requested: i64,
    ) -> DbResult<LineDeduction> {
        if requested <= 0 {
            return Err(DbError::InvalidInput("requested quantity must be positive".into()));
        }

        let line_index = line_index as i64;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let deducted = sqlx::query_as::<_, DeductedRow>(
            r#"
            UPDATE inventory
            SET quantity_on_hand = MAX(quantity_on_hand - ?1, 0),
                last_deducted = MIN(quantity_on_hand, ?1),
                updated_at = ?2
            WHERE item_key = ?3
              AND NOT EXISTS (
                  SELECT 1 FROM inventory_applications
                  WHERE document_id = ?4 AND line_index = ?5
              )
            RETURNING id, item_name, quantity_on_hand, last_deducted
            "#,
        )
        .bind(requested)
        .bind(now)
        .bind(normalize_item_name(item_name))
        .bind(document_id)
        .bind(line_index)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = deducted else {
            let applied: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM inventory_applications WHERE document_id = ?1 AND line_index = ?2",
            )
            .bind(document_id)
            .bind(line_index)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Ok(if applied > 0 {
                debug!(
                    receipt_number = %receipt_number,
                    line = line_index,
                    "Line already deducted"
                );
                LineDeduction::AlreadyApplied
            } else {
                LineDeduction::NotFound
            });
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_applications
                (document_id, line_index, receipt_number, inventory_id, requested_qty, deducted_qty, applied_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(document_id)
        .bind(line_index)
        .bind(receipt_number)
        .bind(&row.id)
        .bind(requested)
        .bind(row.last_deducted)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            receipt_number = %receipt_number,
            item = %row.item_name,
            requested = requested,
            deducted = row.last_deducted,
            remaining = row.quantity_on_hand,
            "Stock deducted"
        );

        Ok(LineDeduction::Applied {
            available_before: row.quantity_on_hand + row.last_deducted,
            new_quantity: row.quantity_on_hand,
            inventory_id: row.id,
            item_name: row.item_name,
        })
    }

    /// Whether a receipt line has already reduced stock.
    pub async fn is_applied(&self, document_id: &str, line_index: usize) -> DbResult<bool> {
        let applied: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_applications WHERE document_id = ?1 AND line_index = ?2",
        )
        .bind(document_id)
        .bind(line_index as i64)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn repo_with(items: &[(&str, i64)]) -> InventoryRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();
        for (name, qty) in items {
            repo.insert(&NewInventoryItem::new(*name, *qty, Money::from_major(5000)))
                .await
                .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let repo = repo_with(&[("Ankara", 10)]).await;

        let item = repo.get_by_name("  ankara ").await.unwrap().unwrap();
        assert_eq!(item.item_name, "Ankara");
        assert_eq!(item.unit_price, Money::from_major(5000));
        assert!(repo.get_by_name("Silk").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let repo = repo_with(&[("Lace", 1)]).await;
        let err = repo
            .insert(&NewInventoryItem::new("LACE", 2, Money::from_major(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deduct_pass_through() {
        let repo = repo_with(&[("Ankara", 10)]).await;

        let outcome = repo.deduct_for_receipt("doc-1", "R1", 0, "Ankara", 3).await.unwrap();
        match outcome {
            LineDeduction::Applied {
                available_before,
                new_quantity,
                ..
            } => {
                assert_eq!(available_before, 10);
                assert_eq!(new_quantity, 7);
            }
            other => panic!("unexpected {:?}", other),
        }

        let item = repo.get_by_name("Ankara").await.unwrap().unwrap();
        assert_eq!(item.quantity_on_hand, 7);
    }

    #[tokio::test]
    async fn test_deduct_clamps_at_zero() {
        let repo = repo_with(&[("Lace", 5)]).await;

        let outcome = repo.deduct_for_receipt("doc-1", "R1", 0, "lace", 8).await.unwrap();
        assert!(matches!(
            outcome,
            LineDeduction::Applied {
                available_before: 5,
                new_quantity: 0,
                ..
            }
        ));
        assert_eq!(
            repo.get_by_name("Lace").await.unwrap().unwrap().quantity_on_hand,
            0
        );
    }

    #[tokio::test]
    async fn test_deduct_unknown_item() {
        let repo = repo_with(&[("Lace", 5)]).await;

        let outcome = repo.deduct_for_receipt("doc-1", "R1", 0, "Silk", 1).await.unwrap();
        assert_eq!(outcome, LineDeduction::NotFound);
        assert!(!repo.is_applied("doc-1", 0).await.unwrap());
        assert_eq!(
            repo.get_by_name("Lace").await.unwrap().unwrap().quantity_on_hand,
            5
        );
    }

    #[tokio::test]
    async fn test_deduct_is_once_per_line() {
        let repo = repo_with(&[("Ankara", 10)]).await;

        repo.deduct_for_receipt("doc-1", "R1", 0, "Ankara", 2).await.unwrap();
        let again = repo.deduct_for_receipt("doc-1", "R1", 0, "Ankara", 2).await.unwrap();
        assert_eq!(again, LineDeduction::AlreadyApplied);

        // Same item on another line of the same receipt still counts.
        repo.deduct_for_receipt("doc-1", "R1", 1, "Ankara", 2).await.unwrap();

        assert_eq!(
            repo.get_by_name("Ankara").await.unwrap().unwrap().quantity_on_hand,
            6
        );
    }

    #[tokio::test]
    async fn test_same_receipt_number_on_two_documents() {
        let repo = repo_with(&[("Lace", 10)]).await;

        repo.deduct_for_receipt("doc-a", "20261018143005000", 0, "Lace", 2)
            .await
            .unwrap();
        let second = repo
            .deduct_for_receipt("doc-b", "20261018143005000", 0, "Lace", 3)
            .await
            .unwrap();

        assert!(matches!(second, LineDeduction::Applied { new_quantity: 5, .. }));
        assert!(repo.is_applied("doc-a", 0).await.unwrap());
        assert!(repo.is_applied("doc-b", 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_quantity_and_restock() {
        let repo = repo_with(&[("Adire", 4)]).await;
        let item = repo.get_by_name("Adire").await.unwrap().unwrap();

        repo.update_quantity(&item.id, 9).await.unwrap();
        assert!(repo.update_quantity(&item.id, -1).await.is_err());
        assert!(matches!(
            repo.update_quantity("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));

        let restocked = repo.restock("adire", 3).await.unwrap();
        assert_eq!(restocked.quantity_on_hand, 12);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(repo.list(10).await.unwrap().len(), 1);
    }
}
