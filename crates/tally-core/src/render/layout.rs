//! # Receipt Layout
//!
//! Places every piece of a [`ReceiptDocument`] on A4 pages. Coordinates are
//! millimetres from the top-left corner of the page; the PDF writer flips
//! them into PDF user space.
//!
//! ## Page Plan
//! ```text
//! ┌──────────────────────────────────────────────────────────┐  y
//! │ [logo]            SEMILOGE TEXTILES                       │  10
//! │                               Receipt No: 20261018143005123│  20
//! │                                         Date: 2026-10-18 ..│  28
//! │                                        Issued by: Tunde   │  36
//! │ Customer Name: Ada                                        │
//! │ ┌──────────────┬──────┬───────────────┬───────────────┐   │
//! │ │ Item         │ Qty  │ Unit Price (N)│ Total (N)     │   │ header (bold)
//! │ ├──────────────┼──────┼───────────────┼───────────────┤   │
//! │ │ Ankara       │  2   │      5,000.00 │     10,000.00 │   │ one row per line
//! │ └──────────────┴──────┴───────────────┴───────────────┘   │
//! │                                    Subtotal: N25,000.00   │
//! │                                  VAT (7.5%): N1,875.00    │
//! │                                       Total: N26,875.00   │
//! │                Thank you for your patronage!              │  (italic)
//! └──────────────────────────────────────────────────────────┘
//! ```
//! Rows that would cross the bottom margin move to a new page, which starts
//! with the table header again.

use super::metrics::{fit_text, text_width, MM_PER_PT};
use super::pdf;
use super::Branding;
use crate::money::format_currency;
use crate::types::ReceiptDocument;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 15.0;

const CONTENT_WIDTH: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
const CELL_PADDING: f32 = 1.0;
const ROW_HEIGHT: f32 = 10.0;
const INFO_LINE_HEIGHT: f32 = 8.0;
const LOGO_X: f32 = 10.0;
const LOGO_Y: f32 = 8.0;
const LOGO_WIDTH: f32 = 33.0;

const HEADER_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const TABLE_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 11.0;

/// The three Helvetica faces used on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// A drawing instruction in page millimetres.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `(x, y)` is the left end of the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font: Font,
        size: f32,
    },
    /// Stroked rectangle, `(x, y)` is the top-left corner.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// The logo image, `(x, y)` is the top-left corner.
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    /// All text on the page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|element| match element {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

struct Column {
    title: String,
    width: f32,
    align: Align,
}

/// A fully placed receipt, ready to serialize.
#[derive(Debug, Clone)]
pub struct ReceiptLayout {
    title: String,
    pages: Vec<Page>,
    branding: Branding,
    issued_at: chrono::DateTime<chrono::Utc>,
}

impl ReceiptLayout {
    /// Lays out `document` with the shop's `branding`.
    pub fn build(document: &ReceiptDocument, branding: &Branding) -> ReceiptLayout {
        let mut builder = Builder::new();
        let symbol = branding.currency_symbol.as_str();

        // Header block
        let mut header_bottom = MARGIN_MM;
        if let Some(logo) = &branding.logo {
            let height = logo.height_for_width(LOGO_WIDTH);
            builder.push(Element::Image {
                x: LOGO_X,
                y: LOGO_Y,
                width: LOGO_WIDTH,
                height,
            });
            header_bottom = LOGO_Y + height;
        }

        builder.full_width(
            ROW_HEIGHT,
            &branding.company_name,
            Font::Bold,
            HEADER_SIZE,
            Align::Center,
        );
        builder.advance(ROW_HEIGHT);

        let info_lines = [
            Some(format!("Receipt No: {}", document.receipt_number)),
            Some(format!("Date: {}", document.issued_at.format("%Y-%m-%d %H:%M"))),
            document
                .issuer_name
                .as_ref()
                .map(|issuer| format!("Issued by: {}", issuer)),
        ];
        for line in info_lines.iter().flatten() {
            builder.full_width(INFO_LINE_HEIGHT, line, Font::Regular, BODY_SIZE, Align::Right);
            builder.advance(INFO_LINE_HEIGHT);
        }

        builder.y = builder.y.max(header_bottom) + 4.0;
        builder.full_width(
            ROW_HEIGHT,
            &format!("Customer Name: {}", document.customer_name),
            Font::Regular,
            BODY_SIZE,
            Align::Left,
        );
        builder.advance(ROW_HEIGHT + 4.0);

        // Item table
        let columns = table_columns(document.has_categories(), symbol);
        builder.table_header(&columns);

        for line in &document.lines {
            if builder.needs_break(ROW_HEIGHT) {
                builder.new_page();
                builder.table_header(&columns);
            }

            let mut cells = vec![line.item.name.clone()];
            if document.has_categories() {
                cells.push(line.item.category.clone().unwrap_or_default());
            }
            cells.push(line.item.quantity.to_string());
            cells.push(format_currency(line.item.unit_price, ""));
            cells.push(format_currency(line.line_total, ""));

            builder.row(&columns, &cells, Font::Regular, TABLE_SIZE);
        }

        // Totals and footer stay together
        let totals = [
            (
                format!("Subtotal: {}", format_currency(document.subtotal, symbol)),
                Font::Regular,
            ),
            (
                format!(
                    "VAT ({}): {}",
                    document.vat_rate,
                    format_currency(document.vat_amount, symbol)
                ),
                Font::Regular,
            ),
            (
                format!("Total: {}", format_currency(document.total, symbol)),
                Font::Bold,
            ),
        ];
        let block_height = 5.0 + totals.len() as f32 * INFO_LINE_HEIGHT + 6.0 + ROW_HEIGHT;
        if builder.needs_break(block_height) {
            builder.new_page();
        } else {
            builder.advance(5.0);
        }

        for (text, font) in &totals {
            builder.full_width(INFO_LINE_HEIGHT, text, *font, BODY_SIZE, Align::Right);
            builder.advance(INFO_LINE_HEIGHT);
        }

        if !branding.footer_message.trim().is_empty() {
            builder.advance(6.0);
            builder.full_width(
                ROW_HEIGHT,
                &branding.footer_message,
                Font::Italic,
                FOOTER_SIZE,
                Align::Center,
            );
        }

        ReceiptLayout {
            title: format!("Receipt {}", document.receipt_number),
            pages: builder.finish(),
            branding: branding.clone(),
            issued_at: document.issued_at,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serializes the layout as a PDF 1.4 document.
    pub fn to_pdf(&self) -> Vec<u8> {
        let info = pdf::DocumentInfo {
            title: self.title.clone(),
            author: self.branding.company_name.clone(),
            created_at: self.issued_at,
        };
        pdf::write_pdf(&self.pages, self.branding.logo.as_ref(), &info)
    }
}

fn table_columns(with_category: bool, symbol: &str) -> Vec<Column> {
    let symbol = symbol.trim();
    let money_title = |label: &str| {
        if symbol.is_empty() {
            label.to_string()
        } else {
            format!("{} ({})", label, symbol)
        }
    };

    let mut columns = Vec::with_capacity(5);
    let (item, qty, money) = if with_category {
        (55.0, 20.0, 40.0)
    } else {
        (70.0, 30.0, 45.0)
    };

    columns.push(Column {
        title: "Item".into(),
        width: item,
        align: Align::Left,
    });
    if with_category {
        columns.push(Column {
            title: "Category".into(),
            width: 35.0,
            align: Align::Left,
        });
    }
    columns.push(Column {
        title: "Qty".into(),
        width: qty,
        align: Align::Center,
    });
    columns.push(Column {
        title: money_title("Unit Price"),
        width: money,
        align: Align::Right,
    });
    columns.push(Column {
        title: money_title("Total"),
        width: money,
        align: Align::Right,
    });
    columns
}

// =============================================================================
// Builder
// =============================================================================

struct Builder {
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl Builder {
    fn new() -> Self {
        Builder {
            pages: Vec::new(),
            current: Page::default(),
            y: MARGIN_MM,
        }
    }

    fn push(&mut self, element: Element) {
        self.current.elements.push(element);
    }

    fn advance(&mut self, height: f32) {
        self.y += height;
    }

    fn needs_break(&self, height: f32) -> bool {
        self.y + height > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.pages.push(page);
        self.y = MARGIN_MM;
    }

    /// An unbordered cell spanning the content width.
    fn full_width(&mut self, height: f32, text: &str, font: Font, size: f32, align: Align) {
        self.cell(MARGIN_MM, CONTENT_WIDTH, height, text, font, size, align, false);
    }

    #[allow(clippy::too_many_arguments)]
    fn cell(
        &mut self,
        x: f32,
        width: f32,
        height: f32,
        text: &str,
        font: Font,
        size: f32,
        align: Align,
        border: bool,
    ) {
        if border {
            self.push(Element::Rect {
                x,
                y: self.y,
                width,
                height,
            });
        }

        let text = fit_text(text, font, size, width - 2.0 * CELL_PADDING);
        if text.is_empty() {
            return;
        }

        let text_w = text_width(&text, font, size);
        let text_x = match align {
            Align::Left => x + CELL_PADDING,
            Align::Center => x + (width - text_w) / 2.0,
            Align::Right => x + width - CELL_PADDING - text_w,
        };
        let baseline = self.y + height / 2.0 + 0.3 * size * MM_PER_PT;

        self.push(Element::Text {
            x: text_x,
            y: baseline,
            text,
            font,
            size,
        });
    }

    fn table_header(&mut self, columns: &[Column]) {
        let titles: Vec<String> = columns.iter().map(|c| c.title.clone()).collect();
        self.row(columns, &titles, Font::Bold, BODY_SIZE);
    }

    fn row(&mut self, columns: &[Column], cells: &[String], font: Font, size: f32) {
        let mut x = MARGIN_MM;
        for (column, text) in columns.iter().zip(cells) {
            self.cell(x, column.width, ROW_HEIGHT, text, font, size, column.align, true);
            x += column.width;
        }
        self.advance(ROW_HEIGHT);
    }

    fn finish(mut self) -> Vec<Page> {
        self.pages.push(self.current);
        self.pages
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::receipt::ReceiptCalculator;
    use crate::render::logo::tests::sample_png;
    use crate::render::Logo;
    use crate::types::{LineItem, TaxRate};

    fn document(lines: Vec<LineItem>) -> ReceiptDocument {
        ReceiptCalculator::new(TaxRate::from_bps(750))
            .compute("Ada", Some("Tunde"), &lines)
            .unwrap()
    }

    fn ada() -> ReceiptDocument {
        document(vec![
            LineItem::new("Ankara", 2, Money::from_major(5000)),
            LineItem::new("Lace", 1, Money::from_major(15000)),
        ])
    }

    #[test]
    fn test_single_page_content() {
        let layout = ReceiptLayout::build(&ada(), &Branding::default());
        assert_eq!(layout.page_count(), 1);

        let texts: Vec<&str> = layout.pages()[0].texts().collect();
        assert!(texts.contains(&"SEMILOGE TEXTILES"));
        assert!(texts.contains(&"Customer Name: Ada"));
        assert!(texts.contains(&"Issued by: Tunde"));
        assert!(texts.contains(&"Unit Price (N)"));
        assert!(texts.contains(&"Subtotal: N25,000.00"));
        assert!(texts.contains(&"VAT (7.5%): N1,875.00"));
        assert!(texts.contains(&"Total: N26,875.00"));
        assert!(texts.contains(&"Thank you for your patronage!"));

        let ankara = texts.iter().position(|t| *t == "Ankara").unwrap();
        let lace = texts.iter().position(|t| *t == "Lace").unwrap();
        assert!(ankara < lace);
        assert_eq!(texts[ankara + 3], "10,000.00");
    }

    #[test]
    fn test_category_column_only_when_used() {
        let layout = ReceiptLayout::build(&ada(), &Branding::default());
        assert!(!layout.pages()[0].texts().any(|t| t == "Category"));

        let doc = document(vec![
            LineItem::new("Ankara", 2, Money::from_major(5000)).with_category("Wax print"),
        ]);
        let layout = ReceiptLayout::build(&doc, &Branding::default());
        let texts: Vec<&str> = layout.pages()[0].texts().collect();
        assert!(texts.contains(&"Category"));
        assert!(texts.contains(&"Wax print"));
    }

    #[test]
    fn test_long_receipt_breaks_pages_and_repeats_header() {
        let lines = (0..60)
            .map(|i| LineItem::new(format!("Bolt {}", i), 1, Money::from_major(100)))
            .collect();
        let layout = ReceiptLayout::build(&document(lines), &Branding::default());

        assert!(layout.page_count() >= 3);
        for page in layout.pages().iter().take(layout.page_count() - 1) {
            assert!(page.texts().any(|t| t == "Item"));
        }

        for page in layout.pages() {
            for element in &page.elements {
                if let Element::Rect { y, height, .. } = element {
                    assert!(y + height <= PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM + 0.01);
                }
            }
        }
    }

    #[test]
    fn test_logo_drawn_first() {
        let branding = Branding::default().with_logo(Logo::from_png(&sample_png()).unwrap());
        let layout = ReceiptLayout::build(&ada(), &branding);

        assert!(matches!(layout.pages()[0].elements[0], Element::Image { .. }));
    }

    #[test]
    fn test_text_right_aligned_inside_margin() {
        let layout = ReceiptLayout::build(&ada(), &Branding::default());
        for element in &layout.pages()[0].elements {
            if let Element::Text { x, text, font, size, .. } = element {
                let right = x + text_width(text, *font, *size);
                assert!(*x >= MARGIN_MM - 0.01, "{} starts off page", text);
                assert!(right <= PAGE_WIDTH_MM - MARGIN_MM + 0.01, "{} overflows", text);
            }
        }
    }
}
