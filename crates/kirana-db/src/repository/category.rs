//! # Category Repository
//!
//! Product categories. Categories nest one level deep in practice, but the
//! schema allows an arbitrary tree via `parent_category_id`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kirana_core::validation::validate_name;
use kirana_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category. Names are unique; a duplicate surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        parent_category_id: Option<i64>,
    ) -> DbResult<Category> {
        validate_name(name)?;

        let now = Utc::now();

        debug!(name = %name, "Creating category");

        let result = sqlx::query(
            r#"
            INSERT INTO categories (name, description, parent_category_id, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(parent_category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Lists active categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by id (no active filter).
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// Active subcategories of a parent.
    pub async fn children(&self, parent_id: i64) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE is_active = 1 AND parent_category_id = ?1 ORDER BY name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Soft-deletes a category. Products keep their `category_id` until the
    /// row is hard-deleted (which sets them NULL via the foreign key).
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Soft-deleting category");

        let now = Utc::now();

        let result =
            sqlx::query("UPDATE categories SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
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
    async fn create_nest_and_soft_delete() {
        let db = test_db().await;
        let repo = db.categories();

        let grocery = repo.create("Grocery", Some("Dry goods"), None).await.unwrap();
        let rice = repo.create("Rice & Grains", None, Some(grocery.id)).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 2);

        let children = repo.children(grocery.id).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, rice.id);

        repo.soft_delete(rice.id).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
        assert!(repo.get_by_id(rice.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.categories();

        repo.create("Grocery", None, None).await.unwrap();
        let err = repo.create("Grocery", None, None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn products_reference_categories() {
        let db = test_db().await;
        let category = db.categories().create("Grocery", None, None).await.unwrap();

        let mut product = crate::test_support::new_product("Rice", 65, 10);
        product.category_id = Some(category.id);
        let product = db.products().create(product).await.unwrap();
        assert_eq!(product.category_id, Some(category.id));

        // unknown category id trips the foreign key
        let mut bad = crate::test_support::new_product("Dal", 90, 10);
        bad.category_id = Some(9999);
        assert!(matches!(
            db.products().create(bad).await.unwrap_err(),
            DbError::ForeignKeyViolation { .. }
        ));
    }
}
