//! # Supplier Repository
//!
//! Straightforward CRUD for product suppliers.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kirana_core::validation::validate_name;
use kirana_core::{Money, Supplier};

/// Fields accepted when registering a supplier.
#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub supplier_code: Option<String>,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub gst_number: Option<String>,
    pub payment_terms: Option<String>,
    pub credit_limit: Money,
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Registers a supplier.
    pub async fn create(&self, new: NewSupplier) -> DbResult<Supplier> {
        validate_name(&new.name)?;

        let now = Utc::now();

        debug!(name = %new.name, "Creating supplier");

        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (
                supplier_code, name, contact_person, phone, email, address, city,
                gst_number, payment_terms, credit_limit, outstanding_amount,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, 0,
                1, ?11, ?11
            )
            "#,
        )
        .bind(&new.supplier_code)
        .bind(&new.name)
        .bind(&new.contact_person)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.gst_number)
        .bind(&new.payment_terms)
        .bind(new.credit_limit)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Lists active suppliers ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE is_active = 1 ORDER BY name LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Searches active suppliers by name, contact person, city or GST number.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Supplier>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = format!("%{}%", query);

        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT * FROM suppliers
            WHERE is_active = 1
              AND (name LIKE ?1 OR contact_person LIKE ?1 OR city LIKE ?1 OR gst_number LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Gets a supplier by id (no active filter; product records may still
    /// reference a deactivated supplier).
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    /// Updates the editable fields, including the outstanding balance.
    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = supplier.id, "Updating supplier");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                supplier_code = ?2,
                name = ?3,
                contact_person = ?4,
                phone = ?5,
                email = ?6,
                address = ?7,
                city = ?8,
                gst_number = ?9,
                payment_terms = ?10,
                credit_limit = ?11,
                outstanding_amount = ?12,
                is_active = ?13,
                updated_at = ?14
            WHERE id = ?1
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.supplier_code)
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(&supplier.city)
        .bind(&supplier.gst_number)
        .bind(&supplier.payment_terms)
        .bind(supplier.credit_limit)
        .bind(supplier.outstanding_amount)
        .bind(supplier.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", supplier.id));
        }

        Ok(())
    }

    /// Soft-deletes a supplier.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Soft-deleting supplier");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE suppliers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    /// Counts active suppliers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn create_list_delete() {
        let db = test_db().await;
        let repo = db.suppliers();

        let supplier = repo
            .create(NewSupplier {
                name: "Gupta Wholesale".to_string(),
                city: Some("Pune".to_string()),
                gst_number: Some("27AAACG1234A1Z5".to_string()),
                credit_limit: Money::from_major(50_000),
                ..NewSupplier::default()
            })
            .await
            .unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);

        let hits = repo.search("gupta", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        repo.soft_delete(supplier.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);

        // id lookup unaffected by the soft delete
        assert!(repo.get_by_id(supplier.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_outstanding_amount() {
        let db = test_db().await;
        let repo = db.suppliers();

        let mut supplier = repo
            .create(NewSupplier {
                name: "Fresh Farms".to_string(),
                ..NewSupplier::default()
            })
            .await
            .unwrap();

        supplier.outstanding_amount = Money::from_major(1250);
        repo.update(&supplier).await.unwrap();

        let fetched = repo.get_by_id(supplier.id).await.unwrap().unwrap();
        assert_eq!(fetched.outstanding_amount, Money::from_major(1250));
    }
}
