//! # POS Configuration
//!
//! Store branding, database location and document storage settings.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_COMPANY_NAME="SEMILOGE TEXTILES"                             │
//! │     TALLY_VAT_RATE=7.5          (percent)                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tally/pos/tally.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.pos/tally.toml (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     7.5% VAT, "N" currency, ./tally.db, ./storage                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! company_name = "SEMILOGE TEXTILES"
//! footer_message = "Thank you for your patronage!"
//! currency_symbol = "N"
//! vat_rate_bps = 750
//! logo_path = "logo.png"
//!
//! [database]
//! path = "tally.db"
//!
//! [storage]
//! root = "storage"
//! public_base_url = "http://localhost:8080/files"
//! output_dir = "receipts"
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tally_core::validation::validate_tax_rate_bps;
use tally_core::{
    Branding, TaxRate, DEFAULT_COMPANY_NAME, DEFAULT_CURRENCY_SYMBOL, DEFAULT_FOOTER_MESSAGE,
    DEFAULT_VAT_RATE_BPS,
};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

// =============================================================================
// Store Settings
// =============================================================================

/// Branding and tax settings printed on every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_company_name")]
    pub company_name: String,

    #[serde(default = "default_footer_message")]
    pub footer_message: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// VAT in basis points (750 = 7.5%).
    #[serde(default = "default_vat_rate_bps")]
    pub vat_rate_bps: u32,

    /// PNG drawn in the top-left corner. Missing files are skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<PathBuf>,
}

fn default_company_name() -> String {
    DEFAULT_COMPANY_NAME.to_string()
}

fn default_footer_message() -> String {
    DEFAULT_FOOTER_MESSAGE.to_string()
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn default_vat_rate_bps() -> u32 {
    DEFAULT_VAT_RATE_BPS
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            company_name: default_company_name(),
            footer_message: default_footer_message(),
            currency_symbol: default_currency_symbol(),
            vat_rate_bps: default_vat_rate_bps(),
            logo_path: None,
        }
    }
}

// =============================================================================
// Database & Storage Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("tally.db")
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
        }
    }
}

/// Where receipt PDFs are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory of the document store ("cloud copy").
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,

    /// URL prefix the document store is served under.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Directory for the local download copy. Unset means bytes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("storage")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/files".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
            output_dir: None,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete receipt desk configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (tally.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.company_name.trim().is_empty() {
            return Err(ConfigError::Invalid("company_name must not be empty".into()));
        }

        validate_tax_rate_bps(self.store.vat_rate_bps)
            .map_err(|_| ConfigError::Invalid(format!(
                "vat_rate_bps must be at most 10000 (100%), got {}",
                self.store.vat_rate_bps
            )))?;

        let url = &self.storage.public_base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "public_base_url must start with http:// or https://, got: {}",
                url
            )));
        }

        Ok(())
    }

    /// Applies `TALLY_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("TALLY_COMPANY_NAME") {
            debug!(company = %name, "Overriding company name from environment");
            self.store.company_name = name;
        }

        if let Some(rate) = lookup("TALLY_VAT_RATE") {
            match percent_to_bps(&rate) {
                Some(bps) => {
                    debug!(bps = bps, "Overriding VAT rate from environment");
                    self.store.vat_rate_bps = bps;
                }
                None => warn!(value = %rate, "Ignoring unparseable TALLY_VAT_RATE"),
            }
        }

        if let Some(symbol) = lookup("TALLY_CURRENCY_SYMBOL") {
            self.store.currency_symbol = symbol;
        }

        if let Some(path) = lookup("TALLY_LOGO_PATH") {
            self.store.logo_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(root) = lookup("TALLY_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }

        if let Some(url) = lookup("TALLY_PUBLIC_BASE_URL") {
            self.storage.public_base_url = url;
        }

        if let Some(dir) = lookup("TALLY_OUTPUT_DIR") {
            self.storage.output_dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "pos")
            .map(|dirs| dirs.config_dir().join("tally.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn vat_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.store.vat_rate_bps)
    }

    /// Branding without the logo; the service loads that from `logo_path`.
    pub fn branding(&self) -> Branding {
        Branding::new(self.store.company_name.trim())
            .with_footer(self.store.footer_message.clone())
            .with_currency_symbol(self.store.currency_symbol.clone())
    }
}

/// "7.5" → 750. Negative or non-numeric input yields `None`.
fn percent_to_bps(value: &str) -> Option<u32> {
    let percent = Decimal::from_str(value.trim().trim_end_matches('%')).ok()?;
    if percent.is_sign_negative() {
        return None;
    }
    (percent * Decimal::ONE_HUNDRED).round().to_u32()
}
