//! # Audit Log Repository
//!
//! Who-did-what log for login and admin operations. Writes are append-only.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::DbResult;
use kirana_core::AuditLog;

/// Repository for audit log entries.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Records an action.
    ///
    /// `details` is stored as JSON text when provided.
    pub async fn record(
        &self,
        user_id: Option<i64>,
        action: &str,
        table_name: Option<&str>,
        record_id: Option<i64>,
        details: Option<serde_json::Value>,
    ) -> DbResult<i64> {
        let now = Utc::now();
        let details_text = details.map(|d| d.to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, table_name, record_id, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(table_name)
        .bind(record_id)
        .bind(details_text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Recent entries, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<AuditLog>> {
        let entries = sqlx::query_as::<_, AuditLog>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Entries touching one table/record pair, newest first.
    pub async fn for_record(&self, table_name: &str, record_id: i64) -> DbResult<Vec<AuditLog>> {
        let entries = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE table_name = ?1 AND record_id = ?2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(table_name)
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
