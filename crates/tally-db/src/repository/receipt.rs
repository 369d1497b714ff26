//! # Receipt Repository
//!
//! The flat receipt log (one row per issued receipt) and its line items.
//!
//! Header and lines are separate writes: the service logs the header first
//! and each line afterwards, and a failure in one does not undo the other.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tally_core::{Money, ReceiptHistoryEntry};
use tracing::debug;

use super::{money_text, parse_money};
use crate::error::{DbError, DbResult};

/// Header row for the receipt log.
#[derive(Debug, Clone)]
pub struct NewReceiptHistory {
    pub receipt_number: String,
    pub customer_name: String,
    pub total_amount: Money,
    pub issuer_name: Option<String>,
    pub document_url: Option<String>,
}

/// One priced line of a logged receipt.
#[derive(Debug, Clone)]
pub struct NewReceiptLine {
    pub receipt_number: String,
    pub line_index: usize,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
    pub category: Option<String>,
}

/// A line read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReceiptLine {
    pub receipt_number: String,
    pub line_index: i64,
    pub item_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
    pub category: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    receipt_number: String,
    customer_name: String,
    total_amount: String,
    issuer_name: Option<String>,
    document_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for ReceiptHistoryEntry {
    type Error = DbError;

    fn try_from(row: HistoryRow) -> DbResult<Self> {
        Ok(ReceiptHistoryEntry {
            total_amount: parse_money("receipt_history.total_amount", &row.total_amount)?,
            receipt_number: row.receipt_number,
            customer_name: row.customer_name,
            issuer_name: row.issuer_name,
            document_url: row.document_url,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    receipt_number: String,
    line_index: i64,
    item_name: String,
    quantity: i64,
    unit_price: String,
    line_total: String,
    category: Option<String>,
}

impl TryFrom<LineRow> for StoredReceiptLine {
    type Error = DbError;

    fn try_from(row: LineRow) -> DbResult<Self> {
        Ok(StoredReceiptLine {
            unit_price: parse_money("receipt_lines.unit_price", &row.unit_price)?,
            line_total: parse_money("receipt_lines.line_total", &row.line_total)?,
            receipt_number: row.receipt_number,
            line_index: row.line_index,
            item_name: row.item_name,
            quantity: row.quantity,
            category: row.category,
        })
    }
}

/// Repository for the receipt log.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Logs a receipt header.
    ///
    /// The total is stored at display precision (2dp); it is the amount the
    /// customer was charged.
    ///
    /// ## Errors
    /// `UniqueViolation` when the receipt number is already logged.
    pub async fn insert_history(&self, entry: &NewReceiptHistory) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO receipt_history
                (receipt_number, customer_name, total_amount, issuer_name, document_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.receipt_number)
        .bind(&entry.customer_name)
        .bind(money_text(entry.total_amount.rounded()))
        .bind(&entry.issuer_name)
        .bind(&entry.document_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => {
                DbError::duplicate(field, entry.receipt_number.as_str())
            }
            other => other,
        })?;

        debug!(
            receipt_number = %entry.receipt_number,
            total = %entry.total_amount,
            "Receipt logged"
        );
        Ok(())
    }

    /// Logs one line of a receipt.
    pub async fn insert_line(&self, line: &NewReceiptLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO receipt_lines
                (receipt_number, line_index, item_name, quantity, unit_price, line_total, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.receipt_number)
        .bind(line.line_index as i64)
        .bind(&line.item_name)
        .bind(line.quantity)
        .bind(money_text(line.unit_price))
        .bind(money_text(line.line_total))
        .bind(&line.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_history(&self, receipt_number: &str) -> DbResult<Option<ReceiptHistoryEntry>> {
        let row = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT receipt_number, customer_name, total_amount, issuer_name, document_url, created_at
            FROM receipt_history
            WHERE receipt_number = ?1
            "#,
        )
        .bind(receipt_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReceiptHistoryEntry::try_from).transpose()
    }

    /// Most recent receipts first.
    pub async fn list_history(&self, limit: u32) -> DbResult<Vec<ReceiptHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT receipt_number, customer_name, total_amount, issuer_name, document_url, created_at
            FROM receipt_history
            ORDER BY created_at DESC, receipt_number DESC
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReceiptHistoryEntry::try_from).collect()
    }

    /// Lines of one receipt, in receipt order.
    pub async fn get_lines(&self, receipt_number: &str) -> DbResult<Vec<StoredReceiptLine>> {
        let rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT receipt_number, line_index, item_name, quantity, unit_price, line_total, category
            FROM receipt_lines
            WHERE receipt_number = ?1
            ORDER BY line_index
            "#,
        )
        .bind(receipt_number)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredReceiptLine::try_from).collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipt_history")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
