//! Application configuration.
//!
//! Loaded once at startup from environment variables (a `.env` file is
//! honored in development). Every value has a default suitable for a local
//! demo; malformed numeric values are configuration errors rather than
//! silent fallbacks.

use std::env;
use std::path::PathBuf;

use kirana_core::checkout::BillingPolicy;
use kirana_core::{Money, RateBps};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite database file path.
    pub database_path: PathBuf,

    /// GST rate applied at billing, in basis points.
    pub tax_rate_bps: u32,

    /// Effective-subtotal threshold for the automatic order discount.
    pub discount_threshold: Money,

    /// Automatic order discount rate, in basis points.
    pub discount_rate_bps: u32,

    /// Stock floor for low-stock alerts.
    pub low_stock_threshold: i64,

    /// Days ahead to flag expiring products.
    pub expiry_alert_days: i64,

    /// Default admin credentials, used only by the setup entry point.
    pub admin_username: String,
    pub admin_password: String,

    /// Store name for receipts.
    pub store_name: String,

    /// Directory for database backups.
    pub backup_dir: PathBuf,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_path: env::var("KIRANA_DB_PATH")
                .unwrap_or_else(|_| "./kirana.db".to_string())
                .into(),

            tax_rate_bps: parse_var("KIRANA_TAX_RATE_BPS", 1800)?,

            discount_threshold: Money::parse(
                &env::var("KIRANA_DISCOUNT_THRESHOLD").unwrap_or_else(|_| "1000.00".to_string()),
            )
            .map_err(|_| ConfigError::InvalidValue("KIRANA_DISCOUNT_THRESHOLD".to_string()))?,

            discount_rate_bps: parse_var("KIRANA_DISCOUNT_RATE_BPS", 500)?,

            low_stock_threshold: parse_var("KIRANA_LOW_STOCK_THRESHOLD", 10)?,

            expiry_alert_days: parse_var("KIRANA_EXPIRY_ALERT_DAYS", 7)?,

            admin_username: env::var("KIRANA_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),

            admin_password: env::var("KIRANA_ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string()),

            store_name: env::var("KIRANA_STORE_NAME").unwrap_or_else(|_| "Kirana Express".to_string()),

            backup_dir: env::var("KIRANA_BACKUP_DIR")
                .unwrap_or_else(|_| "./backups".to_string())
                .into(),
        };

        if config.tax_rate_bps > 10_000 || config.discount_rate_bps > 10_000 {
            return Err(ConfigError::InvalidValue("rate above 100%".to_string()));
        }

        Ok(config)
    }

    /// The billing policy these settings describe.
    pub fn billing_policy(&self) -> BillingPolicy {
        BillingPolicy {
            tax_rate: RateBps::from_bps(self.tax_rate_bps),
            discount_threshold: self.discount_threshold,
            order_discount_rate: RateBps::from_bps(self.discount_rate_bps),
        }
    }
}

/// Parses a numeric env var with a default for the unset case.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
