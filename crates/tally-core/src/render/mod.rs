//! # Receipt Rendering
//!
//! Turns a [`ReceiptDocument`](crate::ReceiptDocument) into something a
//! customer can take home.
//!
//! ```text
//! ReceiptDocument + Branding
//!        │
//!        ├──► ReceiptLayout::build ──► pages of positioned elements
//!        │          │
//!        │          └──► to_pdf() ──► PDF bytes (receipt_<n>.pdf)
//!        │
//!        └──► render_text ──► plain text for the console and logs
//! ```
//!
//! Everything here works on in-memory values. Reading the logo file is the
//! caller's job; hand the bytes to [`Logo::from_png`].

pub mod layout;
pub mod logo;
pub mod metrics;
pub mod pdf;
pub mod text;

pub use layout::{Element, Font, Page, ReceiptLayout};
pub use logo::{Logo, LogoError};
pub use text::render_text;

use crate::money::{format_currency, Money};
use crate::{DEFAULT_COMPANY_NAME, DEFAULT_CURRENCY_SYMBOL, DEFAULT_FOOTER_MESSAGE};

/// Shop identity printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub company_name: String,
    pub footer_message: String,
    pub currency_symbol: String,
    pub logo: Option<Logo>,
}

impl Branding {
    pub fn new(company_name: impl Into<String>) -> Self {
        Branding {
            company_name: company_name.into(),
            ..Branding::default()
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer_message = footer.into();
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn with_logo(mut self, logo: Logo) -> Self {
        self.logo = Some(logo);
        self
    }

    /// Formats an amount with this shop's currency prefix.
    pub fn money(&self, amount: Money) -> String {
        format_currency(amount, &self.currency_symbol)
    }
}

impl Default for Branding {
    fn default() -> Self {
        Branding {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            footer_message: DEFAULT_FOOTER_MESSAGE.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            logo: None,
        }
    }
}
