//! # Receipt Archive
//!
//! Seam over the receipt log so the service can be driven by fakes in tests.

use async_trait::async_trait;
use tally_core::{ReceiptDocument, ReceiptHistoryEntry};
use tally_db::{Database, DbError, NewReceiptHistory, NewReceiptLine};

#[async_trait]
pub trait ReceiptArchive: Send + Sync {
    async fn insert_history(&self, entry: &NewReceiptHistory) -> Result<(), DbError>;

    async fn insert_line(&self, line: &NewReceiptLine) -> Result<(), DbError>;

    async fn list_history(&self, limit: u32) -> Result<Vec<ReceiptHistoryEntry>, DbError>;
}

#[async_trait]
impl ReceiptArchive for Database {
    async fn insert_history(&self, entry: &NewReceiptHistory) -> Result<(), DbError> {
        self.receipts().insert_history(entry).await
    }

    async fn insert_line(&self, line: &NewReceiptLine) -> Result<(), DbError> {
        self.receipts().insert_line(line).await
    }

    async fn list_history(&self, limit: u32) -> Result<Vec<ReceiptHistoryEntry>, DbError> {
        self.receipts().list_history(limit).await
    }
}

/// Header row for a computed document.
pub fn history_entry(
    document: &ReceiptDocument,
    document_url: Option<String>,
) -> NewReceiptHistory {
    NewReceiptHistory {
        receipt_number: document.receipt_number.clone(),
        customer_name: document.customer_name.clone(),
        total_amount: document.total,
        issuer_name: document.issuer_name.clone(),
        document_url,
    }
}

/// Line rows for a computed document, in receipt order.
pub fn line_entries(document: &ReceiptDocument) -> Vec<NewReceiptLine> {
    document
        .lines
        .iter()
        .enumerate()
        .map(|(index, line)| NewReceiptLine {
            receipt_number: document.receipt_number.clone(),
            line_index: index,
            item_name: line.item.name.clone(),
            quantity: line.item.quantity,
            unit_price: line.item.unit_price,
            line_total: line.line_total,
            category: line.item.category.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{LineItem, Money, ReceiptCalculator, TaxRate};

    #[test]
    fn test_line_entries_follow_document() {
        let doc = ReceiptCalculator::new(TaxRate::from_bps(750))
            .compute(
                "Ada",
                Some("Bola Ade"),
                &[
                    LineItem::new("Ankara", 2, Money::from_major(5000)),
                    LineItem::new("Lace", 1, Money::from_major(15000)).with_category("Lace"),
                ],
            )
            .unwrap();

        let lines = line_entries(&doc);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total, Money::from_major(10000));
        assert_eq!(lines[1].line_index, 1);
        assert_eq!(lines[1].category.as_deref(), Some("Lace"));

        let header = history_entry(&doc, None);
        assert_eq!(header.total_amount, doc.total);
        assert_eq!(header.issuer_name.as_deref(), Some("Bola Ade"));
    }
}
