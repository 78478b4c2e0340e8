//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Full-text search using FTS5
//! - CRUD with soft delete
//! - Stock adjustment with movement logging
//! - Low-stock and expiry queries for the inventory panel
//!
//! ## FTS5 Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How FTS5 Search Works                                │
//! │                                                                         │
//! │  User types: "rice"                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  products_fts MATCH 'rice*' across: code, barcode, name, brand         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Join back to products for full rows, active only, ordered by rank     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use kirana_core::validation::{
    validate_code, validate_name, validate_price, validate_rate_bps, validate_search_query,
};
use kirana_core::{Money, MovementType, Product, ReferenceType};

/// Fields accepted when creating a product.
///
/// Identity and bookkeeping fields (id, timestamps, active flag) are owned
/// by the repository.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    /// Business code; generated when absent.
    pub product_code: Option<String>,
    pub barcode: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub brand: Option<String>,
    /// Unit of sale; defaults to "piece".
    pub unit: Option<String>,
    pub unit_price: Money,
    pub cost_price: Option<Money>,
    pub mrp: Option<Money>,
    pub discount_rate_bps: u32,
    pub tax_rate_bps: u32,
    pub quantity_in_stock: i64,
    pub min_stock_level: i64,
    pub max_stock_level: i64,
    pub reorder_level: i64,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub rack_location: Option<String>,
}

/// Aggregate numbers for the inventory panel header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductStats {
    pub total_products: i64,
    pub total_stock_units: i64,
    pub out_of_stock: i64,
    /// Σ cost_price × quantity_in_stock over active products.
    pub stock_cost_value: Money,
    /// Σ unit_price × quantity_in_stock over active products.
    pub stock_retail_value: Money,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns the stored row.
    ///
    /// Validates the name, prices and rates first; a duplicate code or
    /// barcode surfaces as [`DbError::UniqueViolation`].
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        validate_name(&new.name)?;
        validate_price(new.unit_price)?;
        validate_rate_bps("discount_rate", new.discount_rate_bps)?;
        validate_rate_bps("tax_rate", new.tax_rate_bps)?;

        let code = match new.product_code {
            Some(code) => {
                validate_code("product_code", &code)?;
                code
            }
            None => generate_product_code(),
        };
        let unit = new.unit.unwrap_or_else(|| "piece".to_string());
        let now = Utc::now();

        debug!(code = %code, name = %new.name, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                product_code, barcode, name, description, category_id, supplier_id,
                brand, unit, unit_price, cost_price, mrp,
                discount_rate_bps, tax_rate_bps,
                quantity_in_stock, min_stock_level, max_stock_level, reorder_level,
                expiry_date, manufacturing_date, batch_number, rack_location,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13,
                ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21,
                1, ?22, ?22
            )
            "#,
        )
        .bind(&code)
        .bind(&new.barcode)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.category_id)
        .bind(new.supplier_id)
        .bind(&new.brand)
        .bind(&unit)
        .bind(new.unit_price)
        .bind(new.cost_price)
        .bind(new.mrp)
        .bind(new.discount_rate_bps)
        .bind(new.tax_rate_bps)
        .bind(new.quantity_in_stock)
        .bind(new.min_stock_level)
        .bind(new.max_stock_level)
        .bind(new.reorder_level)
        .bind(new.expiry_date)
        .bind(new.manufacturing_date)
        .bind(&new.batch_number)
        .bind(&new.rack_location)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Lists active products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches active products using full-text search.
    ///
    /// The query gets a wildcard suffix for prefix matching: "ric" matches
    /// "Rice", "Ricotta". An empty query falls back to [`Self::list`].
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let fts_query = format!("{}*", query);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.*
            FROM products p
            INNER JOIN products_fts fts ON p.id = fts.rowid
            WHERE products_fts MATCH ?1
              AND p.is_active = 1
            ORDER BY rank
            LIMIT ?2
            "#,
        )
        .bind(fts_query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// Deliberately does NOT filter on `is_active`: transaction detail
    /// screens look up soft-deleted products by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets an active product by barcode (the billing-panel scan path).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE barcode = ?1 AND is_active = 1",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE product_code = ?1 AND is_active = 1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates an existing product's editable fields.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                barcode = ?2,
                name = ?3,
                description = ?4,
                category_id = ?5,
                supplier_id = ?6,
                brand = ?7,
                unit = ?8,
                unit_price = ?9,
                cost_price = ?10,
                mrp = ?11,
                discount_rate_bps = ?12,
                tax_rate_bps = ?13,
                quantity_in_stock = ?14,
                min_stock_level = ?15,
                max_stock_level = ?16,
                reorder_level = ?17,
                expiry_date = ?18,
                manufacturing_date = ?19,
                batch_number = ?20,
                rack_location = ?21,
                is_active = ?22,
                updated_at = ?23
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id)
        .bind(product.supplier_id)
        .bind(&product.brand)
        .bind(&product.unit)
        .bind(product.unit_price)
        .bind(product.cost_price)
        .bind(product.mrp)
        .bind(product.discount_rate_bps)
        .bind(product.tax_rate_bps)
        .bind(product.quantity_in_stock)
        .bind(product.min_stock_level)
        .bind(product.max_stock_level)
        .bind(product.reorder_level)
        .bind(product.expiry_date)
        .bind(product.manufacturing_date)
        .bind(&product.batch_number)
        .bind(&product.rack_location)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Applies a stock delta (negative for sales, positive for restocking).
    ///
    /// Pure column update; callers that need an audit trail use
    /// [`Self::adjust_stock`].
    pub async fn update_stock(&self, id: i64, delta: i64) -> DbResult<()> {
        debug!(id = id, delta = delta, "Updating stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Manual stock adjustment: applies the delta and appends the matching
    /// inventory movement in one transaction.
    pub async fn adjust_stock(
        &self,
        id: i64,
        delta: i64,
        reason: &str,
        employee_id: i64,
    ) -> DbResult<()> {
        if delta == 0 {
            return Ok(());
        }

        let movement_type = if delta > 0 {
            MovementType::In
        } else {
            MovementType::Out
        };
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                product_id, movement_type, quantity, reference_type,
                reference_id, reason, employee_id, movement_date
            ) VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7)
            "#,
        )
        .bind(id)
        .bind(movement_type)
        .bind(delta.abs())
        .bind(ReferenceType::Adjustment)
        .bind(reason)
        .bind(employee_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id = id, delta = delta, "Stock adjusted");
        Ok(())
    }

    /// Soft-deletes a product by setting is_active = 0.
    ///
    /// Historical transaction items still reference the row, so it never
    /// disappears entirely.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Soft-deleting product");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products at or below their reorder level or the given floor.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
              AND quantity_in_stock <= MAX(reorder_level, ?1)
            ORDER BY quantity_in_stock
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Active products expiring on or before `today + days`.
    pub async fn expiring_within(&self, today: NaiveDate, days: i64) -> DbResult<Vec<Product>> {
        let cutoff = today + chrono::Duration::days(days);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE is_active = 1
              AND expiry_date IS NOT NULL
              AND expiry_date <= ?1
            ORDER BY expiry_date
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Aggregate stock statistics over active products.
    pub async fn statistics(&self) -> DbResult<ProductStats> {
        let stats = sqlx::query_as::<_, ProductStats>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(quantity_in_stock), 0) AS total_stock_units,
                COALESCE(SUM(quantity_in_stock <= 0), 0) AS out_of_stock,
                COALESCE(SUM(COALESCE(cost_price, 0) * quantity_in_stock), 0) AS stock_cost_value,
                COALESCE(SUM(unit_price * quantity_in_stock), 0) AS stock_retail_value
            FROM products
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

/// Generates a product code: `PRD-{timestamp}-{random}`.
pub fn generate_product_code() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: String = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("PRD-{}-{}", timestamp, suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_product, seed_employee, test_db};
    use kirana_core::RateBps;

    #[tokio::test]
    async fn create_and_fetch() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.create(new_product("Basmati Rice 5kg", 450, 20)).await.unwrap();
        assert!(product.id > 0);
        assert!(product.product_code.starts_with("PRD-"));
        assert_eq!(product.unit, "piece");
        assert!(product.is_active);

        let fetched = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Basmati Rice 5kg");
        assert_eq!(fetched.unit_price, Money::from_major(450));
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let db = test_db().await;
        let repo = db.products();

        let mut bad = new_product("", 10, 0);
        bad.name = "".to_string();
        assert!(repo.create(bad).await.is_err());

        let mut bad = new_product("Salt", 10, 0);
        bad.discount_rate_bps = 20_000;
        assert!(repo.create(bad).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_barcode_rejected() {
        let db = test_db().await;
        let repo = db.products();

        let mut a = new_product("Tea 250g", 120, 5);
        a.barcode = Some("8901234567890".to_string());
        repo.create(a).await.unwrap();

        let mut b = new_product("Tea 500g", 220, 5);
        b.barcode = Some("8901234567890".to_string());
        let err = repo.create(b).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn fts_search_matches_prefix() {
        let db = test_db().await;
        let repo = db.products();

        repo.create(new_product("Basmati Rice 5kg", 450, 20)).await.unwrap();
        repo.create(new_product("Sona Masoori Rice 10kg", 700, 8)).await.unwrap();
        repo.create(new_product("Wheat Flour 5kg", 260, 12)).await.unwrap();

        let hits = repo.search("ric", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = repo.search("flour", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        // empty query lists everything
        let hits = repo.search("", 10).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn soft_delete_hides_from_list_but_not_id_lookup() {
        let db = test_db().await;
        let repo = db.products();

        let product = repo.create(new_product("Jaggery 1kg", 80, 15)).await.unwrap();
        repo.soft_delete(product.id).await.unwrap();

        assert!(repo.list(10).await.unwrap().is_empty());
        assert!(repo.search("jaggery", 10).await.unwrap().is_empty());

        // direct id lookup still returns the row
        let fetched = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);

        // code lookup filters on active
        assert!(repo.get_by_code(&product.product_code).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn adjust_stock_logs_movement() {
        let db = test_db().await;
        let repo = db.products();
        let employee = seed_employee(&db).await;

        let product = repo.create(new_product("Sugar 1kg", 45, 10)).await.unwrap();
        repo.adjust_stock(product.id, 15, "Purchase order 12", employee).await.unwrap();
        repo.adjust_stock(product.id, -5, "Damaged bags", employee).await.unwrap();

        let fetched = repo.get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fetched.quantity_in_stock, 20);

        let movements = db.inventory().history(Some(product.id), 30, 10).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements.iter().map(|m| m.quantity).sum::<i64>(), 20);
    }

    #[tokio::test]
    async fn low_stock_and_expiring() {
        let db = test_db().await;
        let repo = db.products();

        let mut low = new_product("Matchbox", 2, 3);
        low.reorder_level = 5;
        repo.create(low).await.unwrap();

        let mut fresh = new_product("Paneer 200g", 90, 30);
        fresh.expiry_date = NaiveDate::from_ymd_opt(2026, 8, 10);
        repo.create(fresh).await.unwrap();

        repo.create(new_product("Steel Bucket", 250, 40)).await.unwrap();

        let low = repo.low_stock(0).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Matchbox");

        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let expiring = repo.expiring_within(today, 7).await.unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].name, "Paneer 200g");
    }

    #[tokio::test]
    async fn statistics_sums_valuation() {
        let db = test_db().await;
        let repo = db.products();

        let mut a = new_product("Oil 1L", 120, 10);
        a.cost_price = Some(Money::from_major(95));
        repo.create(a).await.unwrap();

        let mut b = new_product("Ghee 500g", 300, 0);
        b.cost_price = Some(Money::from_major(240));
        repo.create(b).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_stock_units, 10);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.stock_cost_value, Money::from_major(950));
        assert_eq!(stats.stock_retail_value, Money::from_major(1200));
    }

    #[tokio::test]
    async fn discount_rate_accessor_round_trip() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = new_product("Biscuits", 30, 50);
        p.discount_rate_bps = 1000;
        let product = repo.create(p).await.unwrap();
        assert_eq!(product.discount_rate(), RateBps::from_percent(10));
        assert_eq!(product.discounted_price(), Money::from_major(27));
    }
}
