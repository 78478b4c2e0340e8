//! # Customer Repository
//!
//! Database operations for the customer CRM.
//!
//! ## Identity
//! The phone number is the unique business key; the billing panel looks
//! customers up by phone before attaching them to a sale.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kirana_core::validation::{validate_name, validate_phone};
use kirana_core::{Customer, MembershipTier, Money, Transaction};

/// Fields accepted when registering a customer.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
}

/// Aggregate numbers for the customer panel header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerStats {
    pub total_customers: i64,
    pub total_loyalty_points: i64,
    pub total_purchases: Money,
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a customer. A duplicate phone number surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn create(&self, new: NewCustomer) -> DbResult<Customer> {
        validate_name(&new.name)?;
        validate_phone(&new.phone)?;

        let now = Utc::now();
        let today = now.date_naive();

        debug!(name = %new.name, phone = %new.phone, "Creating customer");

        let result = sqlx::query(
            r#"
            INSERT INTO customers (
                customer_code, name, phone, email, address, city, date_of_birth,
                membership_tier, loyalty_points, total_purchases,
                registration_date, last_visit, is_active, created_at, updated_at
            ) VALUES (
                NULL, ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, 0, 0,
                ?8, NULL, 1, ?9, ?9
            )
            "#,
        )
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.city)
        .bind(new.date_of_birth)
        .bind(MembershipTier::Regular)
        .bind(today)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Lists active customers ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE is_active = 1 ORDER BY name LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Searches active customers by name, phone or email (LIKE match).
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = format!("%{}%", query);

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE is_active = 1
              AND (name LIKE ?1 OR phone LIKE ?1 OR email LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by id. Does NOT filter on the active flag; the
    /// transaction detail screen resolves soft-deleted customers too.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Gets an active customer by phone (the billing-counter lookup).
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE phone = ?1 AND is_active = 1",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Updates the editable profile fields.
    pub async fn update(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = customer.id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                phone = ?3,
                email = ?4,
                address = ?5,
                city = ?6,
                date_of_birth = ?7,
                membership_tier = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(customer.date_of_birth)
        .bind(customer.membership_tier)
        .bind(customer.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer.id));
        }

        Ok(())
    }

    /// Soft-deletes a customer.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Soft-deleting customer");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Adds loyalty points outside the billing flow (promotions, goodwill).
    pub async fn add_loyalty_points(&self, id: i64, points: i64) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET loyalty_points = loyalty_points + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(points)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        debug!(id = id, points = points, "Loyalty points added");
        Ok(())
    }

    /// Transactions recorded against a customer, newest first.
    pub async fn purchase_history(&self, id: i64, limit: u32) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE customer_id = ?1
            ORDER BY transaction_date DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Aggregate numbers over active customers.
    pub async fn statistics(&self) -> DbResult<CustomerStats> {
        let stats = sqlx::query_as::<_, CustomerStats>(
            r#"
            SELECT
                COUNT(*) AS total_customers,
                COALESCE(SUM(loyalty_points), 0) AS total_loyalty_points,
                COALESCE(SUM(total_purchases), 0) AS total_purchases
            FROM customers
            WHERE is_active = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    fn new_customer(name: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: phone.to_string(),
            ..NewCustomer::default()
        }
    }

    #[tokio::test]
    async fn create_and_lookup_by_phone() {
        let db = test_db().await;
        let repo = db.customers();

        let customer = repo.create(new_customer("Ravi Kumar", "9876543210")).await.unwrap();
        assert_eq!(customer.membership_tier, MembershipTier::Regular);
        assert_eq!(customer.loyalty_points, 0);
        assert!(customer.total_purchases.is_zero());

        let found = repo.get_by_phone("9876543210").await.unwrap().unwrap();
        assert_eq!(found.id, customer.id);
    }

    #[tokio::test]
    async fn duplicate_phone_rejected() {
        let db = test_db().await;
        let repo = db.customers();

        repo.create(new_customer("Ravi", "9876543210")).await.unwrap();
        let err = repo.create(new_customer("Ravi Again", "9876543210")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn invalid_phone_rejected() {
        let db = test_db().await;
        let err = db.customers().create(new_customer("X", "12")).await.unwrap_err();
        assert!(matches!(err, DbError::Rejected(_)));
    }

    #[tokio::test]
    async fn search_by_fragment() {
        let db = test_db().await;
        let repo = db.customers();

        repo.create(new_customer("Ravi Kumar", "9876543210")).await.unwrap();
        repo.create(new_customer("Meena Ravindran", "9123456780")).await.unwrap();
        repo.create(new_customer("Joseph", "9000000001")).await.unwrap();

        let hits = repo.search("ravi", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        let hits = repo.search("91234", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn soft_delete_hides_from_list_and_phone_lookup() {
        let db = test_db().await;
        let repo = db.customers();

        let customer = repo.create(new_customer("Ravi", "9876543210")).await.unwrap();
        repo.soft_delete(customer.id).await.unwrap();

        assert!(repo.list(10).await.unwrap().is_empty());
        assert!(repo.get_by_phone("9876543210").await.unwrap().is_none());

        // id lookup does not filter
        let fetched = repo.get_by_id(customer.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }

    #[tokio::test]
    async fn loyalty_and_statistics() {
        let db = test_db().await;
        let repo = db.customers();

        let a = repo.create(new_customer("A", "9000000001")).await.unwrap();
        let b = repo.create(new_customer("B", "9000000002")).await.unwrap();

        repo.add_loyalty_points(a.id, 40).await.unwrap();
        repo.add_loyalty_points(b.id, 2).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total_customers, 2);
        assert_eq!(stats.total_loyalty_points, 42);

        assert!(matches!(
            repo.add_loyalty_points(9999, 5).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
