//! # Inventory Movement Repository
//!
//! Append-only audit trail of stock deltas: one row per stock-affecting
//! event (sale, purchase, adjustment, refund). Rows are never updated or
//! deleted.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use kirana_core::{InventoryMovement, MovementType, ReferenceType};

/// Fields for recording a movement directly (purchases, waste).
///
/// The checkout and refund flows write their movements inside their own
/// database transactions; this is for standalone events.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: i64,
    pub movement_type: MovementType,
    /// Always positive; direction comes from `movement_type`.
    pub quantity: i64,
    pub reference_type: ReferenceType,
    pub reference_id: Option<i64>,
    pub reason: Option<String>,
    pub employee_id: i64,
}

/// Repository for the inventory movement log.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Appends a movement row and returns its id.
    pub async fn record(&self, movement: NewMovement) -> DbResult<i64> {
        debug!(
            product_id = movement.product_id,
            movement_type = ?movement.movement_type,
            quantity = movement.quantity,
            "Recording inventory movement"
        );

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                product_id, movement_type, quantity, reference_type,
                reference_id, reason, employee_id, movement_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.reference_type)
        .bind(movement.reference_id)
        .bind(&movement.reason)
        .bind(movement.employee_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Movement history, newest first.
    ///
    /// `product_id` of `None` means all products; `days` bounds how far
    /// back to look.
    pub async fn history(
        &self,
        product_id: Option<i64>,
        days: i64,
        limit: u32,
    ) -> DbResult<Vec<InventoryMovement>> {
        let cutoff = Utc::now() - Duration::days(days);

        let movements = match product_id {
            Some(id) => {
                sqlx::query_as::<_, InventoryMovement>(
                    r#"
                    SELECT * FROM inventory_movements
                    WHERE product_id = ?1 AND movement_date >= ?2
                    ORDER BY movement_date DESC, id DESC
                    LIMIT ?3
                    "#,
                )
                .bind(id)
                .bind(cutoff)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, InventoryMovement>(
                    r#"
                    SELECT * FROM inventory_movements
                    WHERE movement_date >= ?1
                    ORDER BY movement_date DESC, id DESC
                    LIMIT ?2
                    "#,
                )
                .bind(cutoff)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_product, seed_employee, test_db};

    #[tokio::test]
    async fn record_and_filter_history() {
        let db = test_db().await;
        let employee = seed_employee(&db).await;
        let repo = db.inventory();

        let a = db.products().create(new_product("Rice", 65, 10)).await.unwrap();
        let b = db.products().create(new_product("Dal", 90, 10)).await.unwrap();

        repo.record(NewMovement {
            product_id: a.id,
            movement_type: MovementType::In,
            quantity: 50,
            reference_type: ReferenceType::Purchase,
            reference_id: None,
            reason: Some("PO-7".to_string()),
            employee_id: employee,
        })
        .await
        .unwrap();

        repo.record(NewMovement {
            product_id: b.id,
            movement_type: MovementType::Damaged,
            quantity: 2,
            reference_type: ReferenceType::Waste,
            reference_id: None,
            reason: None,
            employee_id: employee,
        })
        .await
        .unwrap();

        let all = repo.history(None, 30, 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let only_a = repo.history(Some(a.id), 30, 10).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].movement_type, MovementType::In);
        assert_eq!(only_a[0].quantity, 50);
    }
}
