//! # Transaction Repository
//!
//! The checkout persistence flow, refunds, and transaction queries.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_sale()                                     │
//! │                                                                         │
//! │  validate cart ── any bad line ──► Rejected, nothing written           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute line amounts + totals (kirana-core, pure)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ─────────────────────────────────────────────┐                  │
//! │    insert header (generated transaction number)     │                  │
//! │    for each line:                                   │                  │
//! │      line_total ≤ 0?  ──► skip line, warn           │ one database     │
//! │      insert transaction_items row                   │ transaction,     │
//! │      stock sufficient? ──► decrement                │ full rollback    │
//! │                       └──► warn, leave stock as-is  │ on hard failure  │
//! │      append inventory movement (warn on failure)    │                  │
//! │    customer attached? add totals + loyalty points   │                  │
//! │  COMMIT ────────────────────────────────────────────┘                  │
//! │                                                                         │
//! │  The insufficient-stock path records the sale WITHOUT adjusting        │
//! │  stock. Sold quantity and stock can diverge under concurrent           │
//! │  depletion; the outcome reports shortages so callers can alert.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::checkout::{self, BillingPolicy, CartLine, TransactionTotals};
use kirana_core::validation::validate_cart_lines;
use kirana_core::{
    CoreError, MovementType, PaymentMethod, PaymentStatus, ReferenceType, Transaction,
    TransactionItem, TransactionType,
};

/// Input to the checkout flow.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Customer to credit, when one is attached to the sale.
    pub customer_id: Option<i64>,

    /// Cashier recording the sale.
    pub employee_id: i64,

    pub lines: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// A line whose stock could not be decremented.
#[derive(Debug, Clone)]
pub struct StockShortage {
    pub product_id: i64,
    pub product_name: String,
    pub available: i64,
    pub requested: i64,
}

/// What the checkout flow persisted.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub transaction_id: i64,
    pub transaction_number: String,
    pub totals: TransactionTotals,
    pub loyalty_points_earned: i64,
    pub items_inserted: usize,
    pub lines_skipped: usize,
    /// Lines recorded without a stock decrement.
    pub shortages: Vec<StockShortage>,
}

/// A row for the recent-transactions list (header + customer name).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionSummary {
    pub id: i64,
    pub transaction_number: String,
    pub transaction_date: chrono::DateTime<Utc>,
    pub total_amount: kirana_core::Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub customer_name: Option<String>,
}

/// An item row joined with its product's display fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemDetail {
    #[sqlx(flatten)]
    pub item: TransactionItem,
    pub product_name: Option<String>,
    pub barcode: Option<String>,
}

/// Full transaction detail for the receipt/detail screen.
#[derive(Debug, Clone)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub customer_name: Option<String>,
    pub employee_name: Option<String>,
    pub items: Vec<ItemDetail>,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Runs the whole checkout flow in one database transaction.
    ///
    /// See the module header for the exact semantics. Returns the persisted
    /// outcome, including any stock shortages encountered along the way.
    pub async fn create_sale(
        &self,
        req: &CheckoutRequest,
        policy: &BillingPolicy,
    ) -> DbResult<CheckoutOutcome> {
        // Whole-cart validation: any bad line rejects the operation before
        // anything touches the database.
        validate_cart_lines(&req.lines).map_err(CoreError::from)?;

        let (computed, totals) = checkout::compute(&req.lines, policy);
        let sellable = computed.iter().filter(|l| l.is_sellable()).count();
        if sellable == 0 {
            return Err(CoreError::NoSellableItems {
                line_count: computed.len(),
            }
            .into());
        }

        let loyalty_points = checkout::loyalty_points_earned(totals.total_amount);
        let transaction_number = generate_transaction_number();
        let now = Utc::now();

        debug!(
            number = %transaction_number,
            lines = computed.len(),
            total = %totals.total_amount,
            "Starting checkout"
        );

        let mut tx = self.pool.begin().await?;

        // Header insert. Failure here aborts the whole sale.
        let header = sqlx::query(
            r#"
            INSERT INTO transactions (
                transaction_number, customer_id, employee_id, transaction_date,
                transaction_type, subtotal, discount_amount, tax_amount, total_amount,
                payment_method, payment_status, loyalty_points_earned, notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?14
            )
            "#,
        )
        .bind(&transaction_number)
        .bind(req.customer_id)
        .bind(req.employee_id)
        .bind(now)
        .bind(TransactionType::Sale)
        .bind(totals.subtotal)
        .bind(totals.discount_amount)
        .bind(totals.tax_amount)
        .bind(totals.total_amount)
        .bind(req.payment_method)
        .bind(PaymentStatus::Completed)
        .bind(loyalty_points)
        .bind(&req.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let transaction_id = header.last_insert_rowid();

        let mut items_inserted = 0usize;
        let mut lines_skipped = 0usize;
        let mut shortages = Vec::new();

        for line in &computed {
            if !line.is_sellable() {
                warn!(
                    product_id = line.product_id,
                    "Skipping cart line with non-positive total"
                );
                lines_skipped += 1;
                continue;
            }

            // Item insert failures (bad product id tripping the foreign
            // key) abort the whole sale.
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    transaction_id, product_id, quantity, unit_price, original_price,
                    discount_rate_bps, discount_amount, tax_rate_bps, tax_amount,
                    line_total, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(transaction_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.original_price)
            .bind(line.discount_rate.bps())
            .bind(line.discount_amount)
            .bind(line.tax_rate.bps())
            .bind(line.tax_amount)
            .bind(line.line_total)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            items_inserted += 1;

            // Stock pre-check and decrement. A failure here only loses the
            // stock update for this line, never the sale.
            let stock_row: Option<(i64, String)> =
                sqlx::query_as("SELECT quantity_in_stock, name FROM products WHERE id = ?1")
                    .bind(line.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            if let Some((available, name)) = stock_row {
                if available >= line.quantity {
                    let update = sqlx::query(
                        r#"
                        UPDATE products
                        SET quantity_in_stock = quantity_in_stock - ?2, updated_at = ?3
                        WHERE id = ?1
                        "#,
                    )
                    .bind(line.product_id)
                    .bind(line.quantity)
                    .bind(now)
                    .execute(&mut *tx)
                    .await;

                    if let Err(e) = update {
                        warn!(
                            product = %name,
                            error = %e,
                            "Stock decrement failed; sale recorded without it"
                        );
                    }
                } else {
                    warn!(
                        product = %name,
                        available = available,
                        requested = line.quantity,
                        "Insufficient stock; sale recorded without stock decrement"
                    );
                    shortages.push(StockShortage {
                        product_id: line.product_id,
                        product_name: name,
                        available,
                        requested: line.quantity,
                    });
                }
            }

            // Movement logging is best-effort.
            let movement = sqlx::query(
                r#"
                INSERT INTO inventory_movements (
                    product_id, movement_type, quantity, reference_type,
                    reference_id, reason, employee_id, movement_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(line.product_id)
            .bind(MovementType::Out)
            .bind(line.quantity)
            .bind(ReferenceType::Sale)
            .bind(transaction_id)
            .bind(format!("Sale - Transaction {transaction_number}"))
            .bind(req.employee_id)
            .bind(now)
            .execute(&mut *tx)
            .await;

            if let Err(e) = movement {
                warn!(
                    product_id = line.product_id,
                    error = %e,
                    "Inventory movement logging failed"
                );
            }
        }

        // Credit the attached customer. Best-effort, like the movement log.
        if let Some(customer_id) = req.customer_id {
            let update = sqlx::query(
                r#"
                UPDATE customers
                SET total_purchases = total_purchases + ?2,
                    loyalty_points = loyalty_points + ?3,
                    last_visit = ?4,
                    updated_at = ?4
                WHERE id = ?1
                "#,
            )
            .bind(customer_id)
            .bind(totals.total_amount)
            .bind(loyalty_points)
            .bind(now)
            .execute(&mut *tx)
            .await;

            if let Err(e) = update {
                warn!(customer_id = customer_id, error = %e, "Customer update failed");
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            number = %transaction_number,
            id = transaction_id,
            items = items_inserted,
            total = %totals.total_amount,
            "Transaction committed"
        );

        Ok(CheckoutOutcome {
            transaction_id,
            transaction_number,
            totals,
            loyalty_points_earned: loyalty_points,
            items_inserted,
            lines_skipped,
            shortages,
        })
    }

    /// Gets a transaction header by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let transaction =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(transaction)
    }

    /// Gets a transaction header by its generated number.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE transaction_number = ?1",
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Item rows for a transaction, in insertion order.
    pub async fn items(&self, transaction_id: i64) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(
            "SELECT * FROM transaction_items WHERE transaction_id = ?1 ORDER BY id",
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Recent transactions with the customer name resolved.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<TransactionSummary>> {
        let rows = sqlx::query_as::<_, TransactionSummary>(
            r#"
            SELECT t.id, t.transaction_number, t.transaction_date, t.total_amount,
                   t.payment_method, t.payment_status, c.name AS customer_name
            FROM transactions t
            LEFT JOIN customers c ON t.customer_id = c.id
            ORDER BY t.transaction_date DESC, t.id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Full details (header, resolved names, items with product names).
    pub async fn details(&self, id: i64) -> DbResult<Option<TransactionDetails>> {
        let Some(transaction) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let (customer_name, employee_name): (Option<String>, Option<String>) = sqlx::query_as(
            r#"
            SELECT c.name, e.name
            FROM transactions t
            LEFT JOIN customers c ON t.customer_id = c.id
            LEFT JOIN employees e ON t.employee_id = e.id
            WHERE t.id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ItemDetail>(
            r#"
            SELECT ti.*, p.name AS product_name, p.barcode
            FROM transaction_items ti
            LEFT JOIN products p ON ti.product_id = p.id
            WHERE ti.transaction_id = ?1
            ORDER BY ti.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(TransactionDetails {
            transaction,
            customer_name,
            employee_name,
            items,
        }))
    }

    /// Refunds a completed transaction: restores stock with matching
    /// return movements and marks the header refunded, in one database
    /// transaction.
    pub async fn refund(&self, id: i64, reason: &str, employee_id: i64) -> DbResult<()> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let items: Vec<(i64, i64)> =
            sqlx::query_as("SELECT product_id, quantity FROM transaction_items WHERE transaction_id = ?1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let updated = sqlx::query(
            r#"
            UPDATE transactions
            SET payment_status = 'refunded', notes = ?2, updated_at = ?3
            WHERE id = ?1 AND payment_status != 'refunded'
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("Refundable transaction", id));
        }

        for (product_id, quantity) in items {
            sqlx::query(
                r#"
                UPDATE products
                SET quantity_in_stock = quantity_in_stock + ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            let movement = sqlx::query(
                r#"
                INSERT INTO inventory_movements (
                    product_id, movement_type, quantity, reference_type,
                    reference_id, reason, employee_id, movement_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(product_id)
            .bind(MovementType::In)
            .bind(quantity)
            .bind(ReferenceType::Return)
            .bind(id)
            .bind(format!("Refund - Transaction ID {id}"))
            .bind(employee_id)
            .bind(now)
            .execute(&mut *tx)
            .await;

            if let Err(e) = movement {
                warn!(product_id = product_id, error = %e, "Refund movement logging failed");
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = id, "Transaction refunded");
        Ok(())
    }
}

/// Generates a transaction number: `TXN-{timestamp}-{random}`.
///
/// The timestamp gives chronological sortability; the random suffix keeps
/// two sales within the same second distinct.
fn generate_transaction_number() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("TXN-{}-{}", timestamp, suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_product, seed_customer, seed_employee, test_db};
    use kirana_core::{Money, RateBps};

    fn line(product_id: i64, qty: i64, price_major: i64, discount_pct: u32) -> CartLine {
        CartLine {
            product_id,
            quantity: qty,
            unit_price: Money::from_major(price_major),
            discount_rate: RateBps::from_percent(discount_pct),
        }
    }

    fn request(employee_id: i64, customer_id: Option<i64>, lines: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            customer_id,
            employee_id,
            lines,
            payment_method: PaymentMethod::Cash,
            notes: None,
        }
    }

    #[tokio::test]
    async fn empty_cart_writes_nothing() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;

        let err = db
            .transactions()
            .create_sale(&request(employee, None, vec![]), &BillingPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));

        assert!(db.transactions().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_line_rejects_whole_cart() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let product = db.products().create(new_product("Rice", 65, 10)).await.unwrap();

        let lines = vec![line(product.id, 3, 65, 0), line(product.id, 0, 65, 0)];
        let err = db
            .transactions()
            .create_sale(&request(employee, None, lines), &BillingPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));

        // stock untouched, nothing recorded
        let p = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(p.quantity_in_stock, 10);
        assert!(db.transactions().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_flow_persists_header_items_stock_and_customer() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let customer = seed_customer(&db, "Ravi", "9876543210").await;

        let rice = db.products().create(new_product("Rice", 65, 10)).await.unwrap();
        let mut mixer = new_product("Mixer Grinder", 450, 4);
        mixer.discount_rate_bps = 1000;
        let mixer = db.products().create(mixer).await.unwrap();

        let lines = vec![line(rice.id, 3, 65, 0), line(mixer.id, 1, 450, 10)];
        let outcome = db
            .transactions()
            .create_sale(&request(employee, Some(customer), lines), &BillingPolicy::default())
            .await
            .unwrap();

        // the worked example: 230.10 + 477.90 = 708.00
        assert_eq!(outcome.totals.subtotal, Money::from_major(645));
        assert_eq!(outcome.totals.total_amount, Money::from_major(708));
        assert_eq!(outcome.items_inserted, 2);
        assert_eq!(outcome.lines_skipped, 0);
        assert!(outcome.shortages.is_empty());
        assert_eq!(outcome.loyalty_points_earned, 70);
        assert!(outcome.transaction_number.starts_with("TXN-"));

        // header equals the sum of the stored items
        let header = db
            .transactions()
            .get_by_id(outcome.transaction_id)
            .await
            .unwrap()
            .unwrap();
        let items = db.transactions().items(outcome.transaction_id).await.unwrap();
        assert_eq!(items.len(), 2);
        let item_total: Money = items.iter().map(|i| i.line_total).sum();
        assert_eq!(header.total_amount, item_total);
        assert_eq!(header.payment_status, PaymentStatus::Completed);
        assert_eq!(header.loyalty_points_earned, 70);

        // stock decremented and movements logged
        let rice_after = db.products().get_by_id(rice.id).await.unwrap().unwrap();
        assert_eq!(rice_after.quantity_in_stock, 7);
        let mixer_after = db.products().get_by_id(mixer.id).await.unwrap().unwrap();
        assert_eq!(mixer_after.quantity_in_stock, 3);
        let movements = db.inventory().history(None, 30, 10).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().all(|m| m.movement_type == MovementType::Out));
        assert!(movements
            .iter()
            .all(|m| m.reference_id == Some(outcome.transaction_id)));

        // customer credited: total and total/10 points
        let customer_after = db.customers().get_by_id(customer).await.unwrap().unwrap();
        assert_eq!(customer_after.total_purchases, Money::from_major(708));
        assert_eq!(customer_after.loyalty_points, 70);
        assert!(customer_after.last_visit.is_some());
    }

    #[tokio::test]
    async fn insufficient_stock_records_sale_without_decrement() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;

        let scarce = db.products().create(new_product("Ghee 1kg", 500, 2)).await.unwrap();

        let outcome = db
            .transactions()
            .create_sale(
                &request(employee, None, vec![line(scarce.id, 5, 500, 0)]),
                &BillingPolicy::default(),
            )
            .await
            .unwrap();

        // the sale stands
        assert_eq!(outcome.items_inserted, 1);
        assert_eq!(outcome.shortages.len(), 1);
        assert_eq!(outcome.shortages[0].available, 2);
        assert_eq!(outcome.shortages[0].requested, 5);

        // but stock was left untouched: sold quantity and stock diverge
        let after = db.products().get_by_id(scarce.id).await.unwrap().unwrap();
        assert_eq!(after.quantity_in_stock, 2);

        let items = db.transactions().items(outcome.transaction_id).await.unwrap();
        assert_eq!(items[0].quantity, 5);
    }

    #[tokio::test]
    async fn fully_discounted_line_skipped_not_fatal() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;

        let freebie = db.products().create(new_product("Sample Sachet", 10, 50)).await.unwrap();
        let rice = db.products().create(new_product("Rice", 65, 10)).await.unwrap();

        let lines = vec![line(freebie.id, 1, 10, 100), line(rice.id, 1, 65, 0)];
        let outcome = db
            .transactions()
            .create_sale(&request(employee, None, lines), &BillingPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.items_inserted, 1);
        assert_eq!(outcome.lines_skipped, 1);

        // only the rice line exists; the freebie left no item row and no
        // stock movement
        let items = db.transactions().items(outcome.transaction_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, rice.id);

        let freebie_after = db.products().get_by_id(freebie.id).await.unwrap().unwrap();
        assert_eq!(freebie_after.quantity_in_stock, 50);
    }

    #[tokio::test]
    async fn all_lines_unsellable_is_rejected() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let freebie = db.products().create(new_product("Sample", 10, 50)).await.unwrap();

        let err = db
            .transactions()
            .create_sale(
                &request(employee, None, vec![line(freebie.id, 1, 10, 100)]),
                &BillingPolicy::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::NoSellableItems { .. })
        ));
        assert!(db.transactions().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_everything() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let rice = db.products().create(new_product("Rice", 65, 10)).await.unwrap();

        // second line references a product id that does not exist, which
        // trips the foreign key on the item insert
        let lines = vec![line(rice.id, 2, 65, 0), line(99_999, 1, 10, 0)];
        let err = db
            .transactions()
            .create_sale(&request(employee, None, lines), &BillingPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        // first line's work was rolled back too
        assert!(db.transactions().recent(10).await.unwrap().is_empty());
        let rice_after = db.products().get_by_id(rice.id).await.unwrap().unwrap();
        assert_eq!(rice_after.quantity_in_stock, 10);
    }

    #[tokio::test]
    async fn order_discount_applies_over_threshold() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let tv = db.products().create(new_product("LED Bulb Pack", 120, 50)).await.unwrap();

        let outcome = db
            .transactions()
            .create_sale(
                &request(employee, None, vec![line(tv.id, 10, 120, 0)]),
                &BillingPolicy::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.totals.order_discount, Money::from_major(60));
        assert_eq!(outcome.totals.total_amount, Money::from_major(1356));
    }

    #[tokio::test]
    async fn refund_restores_stock_and_marks_header() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let rice = db.products().create(new_product("Rice", 65, 10)).await.unwrap();

        let outcome = db
            .transactions()
            .create_sale(
                &request(employee, None, vec![line(rice.id, 4, 65, 0)]),
                &BillingPolicy::default(),
            )
            .await
            .unwrap();

        let before = db.products().get_by_id(rice.id).await.unwrap().unwrap();
        assert_eq!(before.quantity_in_stock, 6);

        db.transactions()
            .refund(outcome.transaction_id, "Customer returned goods", employee)
            .await
            .unwrap();

        let after = db.products().get_by_id(rice.id).await.unwrap().unwrap();
        assert_eq!(after.quantity_in_stock, 10);

        let header = db
            .transactions()
            .get_by_id(outcome.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(header.payment_status, PaymentStatus::Refunded);

        // refunding twice fails
        assert!(db
            .transactions()
            .refund(outcome.transaction_id, "again", employee)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn details_resolve_names() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let customer = seed_customer(&db, "Ravi", "9876543210").await;
        let rice = db.products().create(new_product("Rice", 65, 10)).await.unwrap();

        let outcome = db
            .transactions()
            .create_sale(
                &request(employee, Some(customer), vec![line(rice.id, 1, 65, 0)]),
                &BillingPolicy::default(),
            )
            .await
            .unwrap();

        let details = db
            .transactions()
            .details(outcome.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.customer_name.as_deref(), Some("Ravi"));
        assert_eq!(details.employee_name.as_deref(), Some("Test Clerk"));
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].product_name.as_deref(), Some("Rice"));

        let recent = db.transactions().recent(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].customer_name.as_deref(), Some("Ravi"));
    }
}
