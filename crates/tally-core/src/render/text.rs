//! Plain-text receipt, 64 columns wide.

use super::Branding;
use crate::money::format_currency;
use crate::types::ReceiptDocument;

const WIDTH: usize = 64;

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        kept + "..."
    }
}

fn centered(text: &str) -> String {
    let text = clip(text, WIDTH);
    format!("{:^width$}", text, width = WIDTH).trim_end().to_string()
}

fn right(text: &str) -> String {
    format!("{:>width$}", clip(text, WIDTH), width = WIDTH)
}

/// Renders `document` as monospaced text.
///
/// ```rust
/// use tally_core::{render_text, Branding, LineItem, Money, ReceiptCalculator, TaxRate};
///
/// let doc = ReceiptCalculator::new(TaxRate::from_bps(750))
///     .compute("Ada", None, &[LineItem::new("Lace", 1, Money::from_major(15000))])
///     .unwrap();
/// let text = render_text(&doc, &Branding::default());
/// assert!(text.contains("Total: N16,125.00"));
/// ```
pub fn render_text(document: &ReceiptDocument, branding: &Branding) -> String {
    let symbol = branding.currency_symbol.as_str();
    let rule = "-".repeat(WIDTH);
    let mut out: Vec<String> = Vec::new();

    out.push(centered(&branding.company_name));
    out.push(right(&format!("Receipt No: {}", document.receipt_number)));
    out.push(right(&format!(
        "Date: {}",
        document.issued_at.format("%Y-%m-%d %H:%M")
    )));
    if let Some(issuer) = &document.issuer_name {
        out.push(right(&format!("Issued by: {}", issuer)));
    }
    out.push(String::new());
    out.push(format!("Customer Name: {}", document.customer_name));
    out.push(rule.clone());

    if document.has_categories() {
        out.push(format!(
            "{:<19} {:<12} {:>5} {:>12} {:>12}",
            "Item", "Category", "Qty", "Unit Price", "Total"
        ));
        out.push(rule.clone());
        for line in &document.lines {
            out.push(format!(
                "{:<19} {:<12} {:>5} {:>12} {:>12}",
                clip(&line.item.name, 19),
                clip(line.item.category.as_deref().unwrap_or(""), 12),
                line.item.quantity,
                format_currency(line.item.unit_price, ""),
                format_currency(line.line_total, ""),
            ));
        }
    } else {
        out.push(format!(
            "{:<27} {:>6} {:>14} {:>14}",
            "Item", "Qty", "Unit Price", "Total"
        ));
        out.push(rule.clone());
        for line in &document.lines {
            out.push(format!(
                "{:<27} {:>6} {:>14} {:>14}",
                clip(&line.item.name, 27),
                line.item.quantity,
                format_currency(line.item.unit_price, ""),
                format_currency(line.line_total, ""),
            ));
        }
    }

    out.push(rule);
    out.push(right(&format!(
        "Subtotal: {}",
        format_currency(document.subtotal, symbol)
    )));
    out.push(right(&format!(
        "VAT ({}): {}",
        document.vat_rate,
        format_currency(document.vat_amount, symbol)
    )));
    out.push(right(&format!(
        "Total: {}",
        format_currency(document.total, symbol)
    )));

    if !branding.footer_message.trim().is_empty() {
        out.push(String::new());
        out.push(centered(&branding.footer_message));
    }

    out.join("\n") + "\n"
}
