//! # Report Repository
//!
//! Canned report queries for the reports panel. Read-only; every report
//! counts completed transactions only, so refunds and cancellations drop
//! out of the revenue numbers.
//!
//! Day grouping uses the first ten characters of the stored RFC3339
//! timestamp, which is always the `YYYY-MM-DD` date.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::DbResult;
use kirana_core::{Money, PaymentMethod};

/// One day's sales summary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DailySales {
    pub date: NaiveDate,
    pub transaction_count: i64,
    pub total_subtotal: Money,
    pub total_discount: Money,
    pub total_tax: Money,
    pub total_sales: Money,
}

/// Product performance over a date range.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSales {
    pub product_id: i64,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
}

/// Takings per payment method over a date range.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentBreakdown {
    pub payment_method: PaymentMethod,
    pub transaction_count: i64,
    pub total: Money,
}

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales summary for a single day (zeroes when nothing sold).
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySales> {
        let summary = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                ?1 AS date,
                COUNT(*) AS transaction_count,
                COALESCE(SUM(subtotal), 0) AS total_subtotal,
                COALESCE(SUM(discount_amount), 0) AS total_discount,
                COALESCE(SUM(tax_amount), 0) AS total_tax,
                COALESCE(SUM(total_amount), 0) AS total_sales
            FROM transactions
            WHERE substr(transaction_date, 1, 10) = ?1
              AND payment_status = 'completed'
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Per-day summaries over an inclusive date range.
    ///
    /// Days with no completed sales produce no row.
    pub async fn range_summary(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                substr(transaction_date, 1, 10) AS date,
                COUNT(*) AS transaction_count,
                COALESCE(SUM(subtotal), 0) AS total_subtotal,
                COALESCE(SUM(discount_amount), 0) AS total_discount,
                COALESCE(SUM(tax_amount), 0) AS total_tax,
                COALESCE(SUM(total_amount), 0) AS total_sales
            FROM transactions
            WHERE substr(transaction_date, 1, 10) BETWEEN ?1 AND ?2
              AND payment_status = 'completed'
            GROUP BY substr(transaction_date, 1, 10)
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Top products by revenue over an inclusive date range.
    pub async fn top_products(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        limit: u32,
    ) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT
                ti.product_id,
                COALESCE(p.name, 'Unknown') AS product_name,
                COALESCE(SUM(ti.quantity), 0) AS quantity_sold,
                COALESCE(SUM(ti.line_total), 0) AS revenue
            FROM transaction_items ti
            INNER JOIN transactions t ON ti.transaction_id = t.id
            LEFT JOIN products p ON ti.product_id = p.id
            WHERE substr(t.transaction_date, 1, 10) BETWEEN ?1 AND ?2
              AND t.payment_status = 'completed'
            GROUP BY ti.product_id
            ORDER BY revenue DESC
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Takings broken down by payment method over an inclusive date range.
    pub async fn payment_breakdown(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<PaymentBreakdown>> {
        let rows = sqlx::query_as::<_, PaymentBreakdown>(
            r#"
            SELECT
                payment_method,
                COUNT(*) AS transaction_count,
                COALESCE(SUM(total_amount), 0) AS total
            FROM transactions
            WHERE substr(transaction_date, 1, 10) BETWEEN ?1 AND ?2
              AND payment_status = 'completed'
            GROUP BY payment_method
            ORDER BY total DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::transaction::CheckoutRequest;
    use crate::test_support::{new_product, seed_employee, test_db};
    use chrono::Utc;
    use kirana_core::checkout::{BillingPolicy, CartLine};
    use kirana_core::RateBps;

    async fn sell(db: &crate::Database, employee: i64, product_id: i64, qty: i64, price: i64) -> i64 {
        db.transactions()
            .create_sale(
                &CheckoutRequest {
                    customer_id: None,
                    employee_id: employee,
                    lines: vec![CartLine {
                        product_id,
                        quantity: qty,
                        unit_price: Money::from_major(price),
                        discount_rate: RateBps::zero(),
                    }],
                    payment_method: PaymentMethod::Cash,
                    notes: None,
                },
                &BillingPolicy::default(),
            )
            .await
            .unwrap()
            .transaction_id
    }

    #[tokio::test]
    async fn daily_summary_sums_completed_sales() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let rice = db.products().create(new_product("Rice", 65, 100)).await.unwrap();

        sell(&db, employee, rice.id, 3, 65).await;
        sell(&db, employee, rice.id, 1, 65).await;

        let today = Utc::now().date_naive();
        let summary = db.reports().daily_summary(today).await.unwrap();

        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.total_subtotal, Money::from_major(260));
        // 18% tax on 260
        assert_eq!(summary.total_tax, Money::from_raw(468_000));
        assert_eq!(summary.total_sales, Money::from_raw(3_068_000));
    }

    #[tokio::test]
    async fn refunded_sales_drop_out_of_reports() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let rice = db.products().create(new_product("Rice", 65, 100)).await.unwrap();

        sell(&db, employee, rice.id, 3, 65).await;
        let refunded = sell(&db, employee, rice.id, 2, 65).await;
        db.transactions().refund(refunded, "damaged", employee).await.unwrap();

        let today = Utc::now().date_naive();
        let summary = db.reports().daily_summary(today).await.unwrap();
        assert_eq!(summary.transaction_count, 1);
        assert_eq!(summary.total_subtotal, Money::from_major(195));
    }

    #[tokio::test]
    async fn empty_day_is_all_zeroes() {
        let db = test_db().await;
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let summary = db.reports().daily_summary(day).await.unwrap();
        assert_eq!(summary.transaction_count, 0);
        assert!(summary.total_sales.is_zero());
    }

    #[tokio::test]
    async fn top_products_orders_by_revenue() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let rice = db.products().create(new_product("Rice", 65, 100)).await.unwrap();
        let ghee = db.products().create(new_product("Ghee", 500, 100)).await.unwrap();

        sell(&db, employee, rice.id, 10, 65).await; // 650 + tax
        sell(&db, employee, ghee.id, 2, 500).await; // 1000 + tax

        let today = Utc::now().date_naive();
        let top = db.reports().top_products(today, today, 10).await.unwrap();

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_name, "Ghee");
        assert_eq!(top[0].quantity_sold, 2);
        assert_eq!(top[1].product_name, "Rice");
        assert_eq!(top[1].quantity_sold, 10);
    }

    #[tokio::test]
    async fn payment_breakdown_and_range_summary() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let rice = db.products().create(new_product("Rice", 65, 100)).await.unwrap();

        sell(&db, employee, rice.id, 1, 65).await;
        sell(&db, employee, rice.id, 2, 65).await;

        let today = Utc::now().date_naive();

        let breakdown = db.reports().payment_breakdown(today, today).await.unwrap();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].payment_method, PaymentMethod::Cash);
        assert_eq!(breakdown[0].transaction_count, 2);

        let range = db.reports().range_summary(today, today).await.unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].date, today);
        assert_eq!(range[0].transaction_count, 2);
    }
}
