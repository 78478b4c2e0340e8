//! # System Settings Repository
//!
//! Typed access to the key/value settings table. Defaults are seeded by
//! migration 003; `get_*` helpers parse values by their declared type and
//! fall back to the caller's default on missing or malformed rows.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use kirana_core::checkout::BillingPolicy;
use kirana_core::{Money, RateBps, SettingType, SystemSetting};

/// Repository for system settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets a raw setting row.
    pub async fn get(&self, key: &str) -> DbResult<Option<SystemSetting>> {
        let setting = sqlx::query_as::<_, SystemSetting>(
            "SELECT * FROM system_settings WHERE setting_key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(setting)
    }

    /// All settings, optionally filtered by category.
    pub async fn all(&self, category: Option<&str>) -> DbResult<Vec<SystemSetting>> {
        let settings = match category {
            Some(cat) => {
                sqlx::query_as::<_, SystemSetting>(
                    "SELECT * FROM system_settings WHERE category = ?1 ORDER BY setting_key",
                )
                .bind(cat)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SystemSetting>(
                    "SELECT * FROM system_settings ORDER BY setting_key",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(settings)
    }

    /// Upserts a setting value.
    pub async fn set(&self, key: &str, value: &str, data_type: SettingType) -> DbResult<()> {
        debug!(key = %key, value = %value, "Setting system setting");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, data_type, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (setting_key) DO UPDATE SET
                setting_value = excluded.setting_value,
                data_type = excluded.data_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(data_type)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// String value, or the default when missing.
    pub async fn get_string(&self, key: &str, default: &str) -> DbResult<String> {
        Ok(self
            .get(key)
            .await?
            .and_then(|s| s.setting_value)
            .unwrap_or_else(|| default.to_string()))
    }

    /// Integer value, or the default when missing or malformed.
    pub async fn get_i64(&self, key: &str, default: i64) -> DbResult<i64> {
        let value = self.get(key).await?.and_then(|s| s.setting_value);
        Ok(match value {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key = %key, raw = %raw, "Malformed integer setting, using default");
                default
            }),
            None => default,
        })
    }

    /// Money value (decimal string), or the default when missing/malformed.
    pub async fn get_money(&self, key: &str, default: Money) -> DbResult<Money> {
        let value = self.get(key).await?.and_then(|s| s.setting_value);
        Ok(match value {
            Some(raw) => Money::parse(&raw).unwrap_or_else(|_| {
                warn!(key = %key, raw = %raw, "Malformed decimal setting, using default");
                default
            }),
            None => default,
        })
    }

    /// Boolean value ("true"/"false"/"1"/"0"), or the default.
    pub async fn get_bool(&self, key: &str, default: bool) -> DbResult<bool> {
        let value = self.get(key).await?.and_then(|s| s.setting_value);
        Ok(match value.as_deref().map(str::trim) {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(raw) => {
                warn!(key = %key, raw = %raw, "Malformed boolean setting, using default");
                default
            }
            None => default,
        })
    }

    /// Assembles the billing policy from the seeded settings rows, falling
    /// back to [`BillingPolicy::default`] values per field.
    pub async fn billing_policy(&self) -> DbResult<BillingPolicy> {
        let defaults = BillingPolicy::default();

        let tax_bps = self
            .get_i64("tax_rate_bps", defaults.tax_rate.bps() as i64)
            .await?;
        let threshold = self
            .get_money("discount_threshold", defaults.discount_threshold)
            .await?;
        let discount_bps = self
            .get_i64("discount_rate_bps", defaults.order_discount_rate.bps() as i64)
            .await?;

        Ok(BillingPolicy {
            tax_rate: RateBps::from_bps(tax_bps.clamp(0, 10_000) as u32),
            discount_threshold: threshold,
            order_discount_rate: RateBps::from_bps(discount_bps.clamp(0, 10_000) as u32),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
