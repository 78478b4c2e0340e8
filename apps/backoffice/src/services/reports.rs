//! # Report Service
//!
//! Canned reports for the reports panel, plus CSV export. Query work lives
//! in the report/product repositories; this module shapes results for
//! display and file dumps.
//!
//! CSV output follows RFC 4180 quoting: fields containing commas, quotes
//! or newlines are wrapped in double quotes with inner quotes doubled.

use chrono::NaiveDate;
use std::path::Path;

use kirana_core::{Money, Product};
use kirana_db::repository::product::ProductStats;
use kirana_db::repository::report::{DailySales, PaymentBreakdown, ProductSales};
use kirana_db::Database;

use crate::error::AppError;

/// Formats a money value with two decimals for receipts and CSV
/// (half-up from the stored four decimals).
pub fn format_amount(amount: Money) -> String {
    let raw = amount.raw();
    let rounded = if raw >= 0 { (raw + 50) / 100 } else { (raw - 50) / 100 };
    let sign = if rounded < 0 { "-" } else { "" };
    let rounded = rounded.abs();
    format!("{}{}.{:02}", sign, rounded / 100, rounded % 100)
}

/// Quotes a CSV field when needed.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Joins fields into one CSV row.
fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// The reports panel's query service.
#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
    low_stock_threshold: i64,
    expiry_alert_days: i64,
}

impl ReportService {
    /// Creates a report service with the configured alert thresholds.
    pub fn new(db: Database, low_stock_threshold: i64, expiry_alert_days: i64) -> Self {
        ReportService {
            db,
            low_stock_threshold,
            expiry_alert_days,
        }
    }

    /// Sales summary for one day.
    pub async fn daily_sales(&self, date: NaiveDate) -> Result<DailySales, AppError> {
        Ok(self.db.reports().daily_summary(date).await?)
    }

    /// Per-day summaries over an inclusive range.
    pub async fn sales_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailySales>, AppError> {
        Ok(self.db.reports().range_summary(from, to).await?)
    }

    /// Top products by revenue over an inclusive range.
    pub async fn top_products(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> Result<Vec<ProductSales>, AppError> {
        Ok(self.db.reports().top_products(from, to, limit).await?)
    }

    /// Takings per payment method over an inclusive range.
    pub async fn payment_breakdown(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PaymentBreakdown>, AppError> {
        Ok(self.db.reports().payment_breakdown(from, to).await?)
    }

    /// Products at or below the configured stock floor.
    pub async fn low_stock(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.db.products().low_stock(self.low_stock_threshold).await?)
    }

    /// Products expiring within the configured alert window.
    pub async fn expiring(&self, today: NaiveDate) -> Result<Vec<Product>, AppError> {
        Ok(self
            .db
            .products()
            .expiring_within(today, self.expiry_alert_days)
            .await?)
    }

    /// Stock counts and valuation.
    pub async fn stock_valuation(&self) -> Result<ProductStats, AppError> {
        Ok(self.db.products().statistics().await?)
    }
}

// =============================================================================
// CSV Builders
// =============================================================================

/// Daily sales rows as CSV.
pub fn daily_sales_csv(rows: &[DailySales]) -> String {
    let mut out = vec!["date,transactions,subtotal,discount,tax,total".to_string()];
    for row in rows {
        out.push(csv_row(&[
            row.date.to_string(),
            row.transaction_count.to_string(),
            format_amount(row.total_subtotal),
            format_amount(row.total_discount),
            format_amount(row.total_tax),
            format_amount(row.total_sales),
        ]));
    }
    out.join("\n")
}

/// Product performance rows as CSV.
pub fn top_products_csv(rows: &[ProductSales]) -> String {
    let mut out = vec!["product_id,product_name,quantity_sold,revenue".to_string()];
    for row in rows {
        out.push(csv_row(&[
            row.product_id.to_string(),
            row.product_name.clone(),
            row.quantity_sold.to_string(),
            format_amount(row.revenue),
        ]));
    }
    out.join("\n")
}

/// Low-stock / expiring product rows as CSV.
pub fn stock_report_csv(rows: &[Product]) -> String {
    let mut out =
        vec!["product_code,name,quantity_in_stock,reorder_level,expiry_date".to_string()];
    for p in rows {
        out.push(csv_row(&[
            p.product_code.clone(),
            p.name.clone(),
            p.quantity_in_stock.to_string(),
            p.reorder_level.to_string(),
            p.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
        ]));
    }
    out.join("\n")
}

/// Payment breakdown rows as CSV.
pub fn payment_breakdown_csv(rows: &[PaymentBreakdown]) -> String {
    let mut out = vec!["payment_method,transactions,total".to_string()];
    for row in rows {
        out.push(csv_row(&[
            row.payment_method.as_str().to_string(),
            row.transaction_count.to_string(),
            format_amount(row.total),
        ]));
    }
    out.join("\n")
}

/// Writes a CSV dump to disk.
pub fn export(path: &Path, contents: &str) -> Result<(), AppError> {
    std::fs::write(path, contents)
        .map_err(|e| AppError::internal(format!("CSV export failed: {e}")))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_core::PaymentMethod;

    #[test]
    fn amount_formatting_rounds_half_up() {
        assert_eq!(format_amount(Money::from_major(708)), "708.00");
        assert_eq!(format_amount(Money::from_raw(4_779_000)), "477.90");
        // 0.1250 rounds up to 0.13
        assert_eq!(format_amount(Money::from_raw(1_250)), "0.13");
        // 0.1249 rounds down to 0.12
        assert_eq!(format_amount(Money::from_raw(1_249)), "0.12");
        assert_eq!(format_amount(Money::from_raw(-55_000)), "-5.50");
    }

    #[test]
    fn csv_escaping() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("has,comma"), "\"has,comma\"");
        assert_eq!(csv_escape("has \"quote\""), "\"has \"\"quote\"\"\"");
    }

    #[test]
    fn daily_csv_shape() {
        let rows = vec![DailySales {
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            transaction_count: 2,
            total_subtotal: Money::from_major(260),
            total_discount: Money::zero(),
            total_tax: Money::from_raw(468_000),
            total_sales: Money::from_raw(3_068_000),
        }];

        let csv = daily_sales_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "date,transactions,subtotal,discount,tax,total");
        assert_eq!(lines[1], "2026-08-07,2,260.00,0.00,46.80,306.80");
    }

    #[test]
    fn product_name_with_comma_is_quoted() {
        let rows = vec![ProductSales {
            product_id: 1,
            product_name: "Rice, Basmati 5kg".to_string(),
            quantity_sold: 3,
            revenue: Money::from_major(195),
        }];

        let csv = top_products_csv(&rows);
        assert!(csv.contains("\"Rice, Basmati 5kg\""));
    }

    #[test]
    fn payment_csv_uses_snake_case_names() {
        let rows = vec![PaymentBreakdown {
            payment_method: PaymentMethod::LoyaltyPoints,
            transaction_count: 1,
            total: Money::from_major(50),
        }];

        let csv = payment_breakdown_csv(&rows);
        assert!(csv.contains("loyalty_points,1,50.00"));
    }
}
