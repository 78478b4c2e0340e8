//! # Session & Role Gating
//!
//! Login and role-based panel access.
//!
//! ## Panel Access by Role
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Role      Panels                                                       │
//! │  ────      ──────                                                       │
//! │  admin     Inventory, Billing, Customers, Employees, Reports, Admin     │
//! │  manager   Inventory, Billing, Customers, Employees, Reports            │
//! │  cashier   Billing                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::info;

use kirana_core::{User, UserRole};
use kirana_db::Database;

use crate::error::AppError;

/// The back-office panels a session can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Inventory,
    Billing,
    Customers,
    Employees,
    Reports,
    Admin,
}

impl Panel {
    /// All panels, in tab order.
    pub const ALL: [Panel; 6] = [
        Panel::Inventory,
        Panel::Billing,
        Panel::Customers,
        Panel::Employees,
        Panel::Reports,
        Panel::Admin,
    ];
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    user: User,
}

impl Session {
    /// Authenticates against the user repository.
    ///
    /// All failure modes (unknown user, wrong password, disabled account)
    /// surface as the same unauthorized error; the distinction lives in the
    /// audit log.
    pub async fn login(db: &Database, username: &str, password: &str) -> Result<Session, AppError> {
        let user = db
            .users()
            .authenticate(username, password)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid username or password"))?;

        info!(username = %user.username, role = user.role.as_str(), "Session opened");
        Ok(Session { user })
    }

    /// The logged-in user.
    pub fn user(&self) -> &User {
        &self.user
    }

    /// The session's role.
    pub fn role(&self) -> UserRole {
        self.user.role
    }

    /// Whether this session may open a panel.
    pub fn can_access(&self, panel: Panel) -> bool {
        match self.user.role {
            UserRole::Admin => true,
            UserRole::Manager => panel != Panel::Admin,
            UserRole::Cashier => panel == Panel::Billing,
        }
    }

    /// The panels this session's main window shows, in tab order.
    pub fn panels(&self) -> Vec<Panel> {
        Panel::ALL
            .into_iter()
            .filter(|p| self.can_access(*p))
            .collect()
    }

    /// Errors unless the panel is accessible; for service entry points.
    pub fn require(&self, panel: Panel) -> Result<(), AppError> {
        if self.can_access(panel) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Role '{}' cannot access {:?}",
                self.user.role.as_str(),
                panel
            )))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kirana_db::DbConfig;

    async fn db_with_users() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let users = db.users();
        users.create("root", "pw", UserRole::Admin, None, None).await.unwrap();
        users.create("mgr", "pw", UserRole::Manager, None, None).await.unwrap();
        users.create("till", "pw", UserRole::Cashier, None, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let db = db_with_users().await;

        assert!(Session::login(&db, "root", "pw").await.is_ok());
        let err = Session::login(&db, "root", "nope").await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn admin_sees_every_panel() {
        let db = db_with_users().await;
        let session = Session::login(&db, "root", "pw").await.unwrap();
        assert_eq!(session.panels().len(), 6);
        assert!(session.require(Panel::Admin).is_ok());
    }

    #[tokio::test]
    async fn manager_sees_all_but_admin() {
        let db = db_with_users().await;
        let session = Session::login(&db, "mgr", "pw").await.unwrap();
        assert!(!session.can_access(Panel::Admin));
        assert!(session.can_access(Panel::Reports));
        assert_eq!(session.panels().len(), 5);
        assert!(session.require(Panel::Admin).is_err());
    }

    #[tokio::test]
    async fn cashier_sees_billing_only() {
        let db = db_with_users().await;
        let session = Session::login(&db, "till", "pw").await.unwrap();
        assert_eq!(session.panels(), vec![Panel::Billing]);
        assert!(session.require(Panel::Billing).is_ok());
        assert!(session.require(Panel::Inventory).is_err());
    }
}
