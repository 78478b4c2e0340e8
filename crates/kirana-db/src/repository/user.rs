//! # User Repository
//!
//! Login accounts and authentication.
//!
//! ## Authentication Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(username, password)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT row by username ── none ──► None (audited as failed attempt)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  is_active? ── no ──► None (account disabled, audited)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  argon2 verify ── mismatch ──► None (audited)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Some(User), login audited                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Password hashes are argon2id PHC strings with an embedded per-hash salt;
//! they never leave this module.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use kirana_core::{User, UserRole};

/// Private row carrying the hash; only `authenticate`/`change_password`
/// read it.
#[derive(Debug, sqlx::FromRow)]
struct UserAuthRow {
    id: i64,
    username: String,
    password_hash: String,
    role: UserRole,
    email: Option<String>,
    phone: Option<String>,
    is_active: bool,
    created_at: chrono::DateTime<Utc>,
}

impl UserAuthRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            role: self.role,
            email: self.email,
            phone: self.phone,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Repository for login accounts.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a login account. A duplicate username surfaces as
    /// [`DbError::UniqueViolation`].
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> DbResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(kirana_core::ValidationError::Required {
                field: "username".to_string(),
            }
            .into());
        }
        if password.is_empty() {
            return Err(kirana_core::ValidationError::Required {
                field: "password".to_string(),
            }
            .into());
        }

        let hash = hash_password(password)?;
        let now = Utc::now();

        debug!(username = %username, role = ?role, "Creating user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, email, phone, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
        )
        .bind(username)
        .bind(&hash)
        .bind(role)
        .bind(email)
        .bind(phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.record_audit(Some(id), "User created", Some(id)).await;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Verifies credentials. Returns `None` for unknown usernames, disabled
    /// accounts and wrong passwords; the distinction goes to the audit log
    /// and the tracing output, not to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserAuthRow>("SELECT * FROM users WHERE username = ?1")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            warn!(username = %username, "Login failed: unknown user");
            self.record_audit(None, "Failed login attempt", None).await;
            return Ok(None);
        };

        if !row.is_active {
            warn!(username = %username, "Login failed: account disabled");
            self.record_audit(Some(row.id), "Login attempt on disabled account", Some(row.id))
                .await;
            return Ok(None);
        }

        if !verify_password(password, &row.password_hash) {
            warn!(username = %username, "Login failed: wrong password");
            self.record_audit(Some(row.id), "Failed login attempt", Some(row.id))
                .await;
            return Ok(None);
        }

        info!(username = %username, "User authenticated");
        self.record_audit(Some(row.id), "User login", Some(row.id)).await;

        Ok(Some(row.into_user()))
    }

    /// Changes a password after verifying the old one.
    pub async fn change_password(&self, id: i64, old: &str, new: &str) -> DbResult<()> {
        let row = sqlx::query_as::<_, UserAuthRow>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if !verify_password(old, &row.password_hash) {
            warn!(id = id, "Password change rejected: old password mismatch");
            return Err(DbError::Rejected(
                kirana_core::ValidationError::InvalidFormat {
                    field: "old_password".to_string(),
                    reason: "does not match".to_string(),
                }
                .into(),
            ));
        }

        if new.is_empty() {
            return Err(kirana_core::ValidationError::Required {
                field: "new_password".to_string(),
            }
            .into());
        }

        let hash = hash_password(new)?;
        let now = Utc::now();

        sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(&hash)
            .bind(now)
            .execute(&self.pool)
            .await?;

        self.record_audit(Some(id), "Password changed", Some(id)).await;
        Ok(())
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserAuthRow>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserAuthRow::into_user))
    }

    /// Gets a user by username.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserAuthRow>("SELECT * FROM users WHERE username = ?1")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserAuthRow::into_user))
    }

    /// Lists all accounts (the admin panel shows disabled ones too).
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserAuthRow>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(UserAuthRow::into_user).collect())
    }

    /// Disables an account (soft delete).
    pub async fn deactivate(&self, id: i64) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.record_audit(Some(id), "User deactivated", Some(id)).await;
        Ok(())
    }

    /// Ensures a default admin account exists, creating it with the given
    /// credentials when missing. Returns true when a new account was made.
    ///
    /// Called by the setup entry point, never silently on normal startup.
    pub async fn ensure_default_admin(&self, username: &str, password: &str) -> DbResult<bool> {
        if self.get_by_username(username).await?.is_some() {
            debug!(username = %username, "Default admin already exists");
            return Ok(false);
        }

        self.create(username, password, UserRole::Admin, None, None)
            .await?;
        info!(username = %username, "Default admin account created");
        Ok(true)
    }

    /// Best-effort audit write; failures are logged, never propagated, so
    /// auditing cannot break a login.
    async fn record_audit(&self, user_id: Option<i64>, action: &str, record_id: Option<i64>) {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (user_id, action, table_name, record_id, details, created_at)
            VALUES (?1, ?2, 'users', ?3, NULL, ?4)
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(record_id)
        .bind(now)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(error = %e, action = %action, "Audit log write failed");
        }
    }
}

/// Hashes a password with argon2id and a fresh salt.
fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DbError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies a password against a stored PHC hash string.
fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
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
    async fn create_and_authenticate() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo
            .create("asha", "secret123", UserRole::Cashier, None, None)
            .await
            .unwrap();
        assert_eq!(user.role, UserRole::Cashier);

        let ok = repo.authenticate("asha", "secret123").await.unwrap();
        assert_eq!(ok.unwrap().id, user.id);

        let bad = repo.authenticate("asha", "wrong").await.unwrap();
        assert!(bad.is_none());

        let unknown = repo.authenticate("nobody", "secret123").await.unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn disabled_account_cannot_login() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo
            .create("vikram", "pw", UserRole::Manager, None, None)
            .await
            .unwrap();
        repo.deactivate(user.id).await.unwrap();

        assert!(repo.authenticate("vikram", "pw").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let db = test_db().await;
        let repo = db.users();

        repo.create("admin", "pw", UserRole::Admin, None, None).await.unwrap();
        let err = repo
            .create("admin", "pw2", UserRole::Cashier, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn change_password_requires_old() {
        let db = test_db().await;
        let repo = db.users();

        let user = repo
            .create("asha", "old-pw", UserRole::Cashier, None, None)
            .await
            .unwrap();

        assert!(repo.change_password(user.id, "wrong", "new-pw").await.is_err());
        repo.change_password(user.id, "old-pw", "new-pw").await.unwrap();

        assert!(repo.authenticate("asha", "old-pw").await.unwrap().is_none());
        assert!(repo.authenticate("asha", "new-pw").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ensure_default_admin_is_idempotent() {
        let db = test_db().await;
        let repo = db.users();

        assert!(repo.ensure_default_admin("admin", "admin").await.unwrap());
        assert!(!repo.ensure_default_admin("admin", "admin").await.unwrap());

        let users = repo.list().await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn logins_are_audited() {
        let db = test_db().await;
        let repo = db.users();

        repo.create("asha", "pw", UserRole::Cashier, None, None).await.unwrap();
        repo.authenticate("asha", "pw").await.unwrap();
        repo.authenticate("asha", "nope").await.unwrap();

        let entries = db.audit().recent(10).await.unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert!(actions.contains(&"User login"));
        assert!(actions.contains(&"Failed login attempt"));
    }
}
