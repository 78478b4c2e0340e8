//! # Employee Repository
//!
//! Database operations for employee records (staffing/payroll side; login
//! accounts live in the user repository).

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use kirana_core::validation::{validate_code, validate_name};
use kirana_core::{Employee, EmployeeRole, EmployeeStatus, Money};

/// Fields accepted when hiring an employee.
#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    /// Business code; generated when absent.
    pub employee_code: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: EmployeeRole,
    /// Department; defaults from the role when absent.
    pub department: Option<String>,
    pub salary: Option<Money>,
    /// Hire date; defaults to today.
    pub hire_date: Option<NaiveDate>,
}

/// Aggregate numbers for the employee panel header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployeeStats {
    pub total_employees: i64,
    pub active_employees: i64,
    pub total_salary: Money,
}

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Creates an employee record.
    pub async fn create(&self, new: NewEmployee) -> DbResult<Employee> {
        validate_name(&new.name)?;

        let code = match new.employee_code {
            Some(code) => {
                validate_code("employee_code", &code)?;
                code
            }
            None => generate_employee_code(),
        };
        let department = new
            .department
            .unwrap_or_else(|| new.role.default_department().to_string());
        let now = Utc::now();
        let hire_date = new.hire_date.unwrap_or_else(|| now.date_naive());

        debug!(code = %code, name = %new.name, role = ?new.role, "Creating employee");

        let result = sqlx::query(
            r#"
            INSERT INTO employees (
                employee_code, name, phone, email, role, department,
                salary, hire_date, status, last_login, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, NULL, ?10, ?10
            )
            "#,
        )
        .bind(&code)
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.role)
        .bind(&department)
        .bind(new.salary)
        .bind(hire_date)
        .bind(EmployeeStatus::Active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", id))
    }

    /// Lists active employees ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE status = 'active' ORDER BY name LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// Active employees holding a given role.
    pub async fn list_by_role(&self, role: EmployeeRole) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE status = 'active' AND role = ?1 ORDER BY name",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// Searches active employees by name, code or email.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Employee>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = format!("%{}%", query);

        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT * FROM employees
            WHERE status = 'active'
              AND (name LIKE ?1 OR employee_code LIKE ?1 OR email LIKE ?1)
            ORDER BY name
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// Gets an employee by id. No status filter: inactive employees stay
    /// resolvable for transaction history.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// Gets an employee by business code. No status filter either.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Employee>> {
        let employee =
            sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE employee_code = ?1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(employee)
    }

    /// Updates the editable fields (role, department, salary, contact,
    /// status).
    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = employee.id, "Updating employee");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                name = ?2,
                phone = ?3,
                email = ?4,
                role = ?5,
                department = ?6,
                salary = ?7,
                hire_date = ?8,
                status = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(employee.id)
        .bind(&employee.name)
        .bind(&employee.phone)
        .bind(&employee.email)
        .bind(employee.role)
        .bind(&employee.department)
        .bind(employee.salary)
        .bind(employee.hire_date)
        .bind(employee.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", employee.id));
        }

        Ok(())
    }

    /// Soft delete: marks the employee inactive.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Deactivating employee");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE employees SET status = 'inactive', updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }

    /// Aggregate counts and salary total (active salaries only).
    pub async fn statistics(&self) -> DbResult<EmployeeStats> {
        let stats = sqlx::query_as::<_, EmployeeStats>(
            r#"
            SELECT
                COUNT(*) AS total_employees,
                COALESCE(SUM(status = 'active'), 0) AS active_employees,
                COALESCE(SUM(CASE WHEN status = 'active' THEN COALESCE(salary, 0) ELSE 0 END), 0)
                    AS total_salary
            FROM employees
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

/// Generates an employee code: `EMP{YYmmdd}-{random}`.
pub fn generate_employee_code() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("EMP{}-{}", Utc::now().format("%y%m%d"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    fn cashier(name: &str) -> NewEmployee {
        NewEmployee {
            name: name.to_string(),
            role: EmployeeRole::Cashier,
            salary: Some(Money::from_major(18_000)),
            ..NewEmployee::default()
        }
    }

    #[tokio::test]
    async fn create_fills_defaults() {
        let db = test_db().await;
        let repo = db.employees();

        let emp = repo.create(cashier("Asha")).await.unwrap();
        assert!(emp.employee_code.starts_with("EMP"));
        assert_eq!(emp.department, "Sales");
        assert_eq!(emp.status, EmployeeStatus::Active);
        assert_eq!(emp.hire_date, Utc::now().date_naive());
    }

    #[tokio::test]
    async fn list_by_role() {
        let db = test_db().await;
        let repo = db.employees();

        repo.create(cashier("Asha")).await.unwrap();
        repo.create(NewEmployee {
            name: "Vikram".to_string(),
            role: EmployeeRole::Manager,
            employee_code: Some("EMP-MGR-1".to_string()),
            ..NewEmployee::default()
        })
        .await
        .unwrap();

        let cashiers = repo.list_by_role(EmployeeRole::Cashier).await.unwrap();
        assert_eq!(cashiers.len(), 1);
        assert_eq!(cashiers[0].name, "Asha");

        let managers = repo.list_by_role(EmployeeRole::Manager).await.unwrap();
        assert_eq!(managers[0].department, "Management");
    }

    #[tokio::test]
    async fn soft_delete_leaves_code_lookup_working() {
        let db = test_db().await;
        let repo = db.employees();

        let emp = repo.create(cashier("Asha")).await.unwrap();
        repo.soft_delete(emp.id).await.unwrap();

        assert!(repo.list(10).await.unwrap().is_empty());

        // code lookup does not filter on status
        let fetched = repo.get_by_code(&emp.employee_code).await.unwrap().unwrap();
        assert_eq!(fetched.status, EmployeeStatus::Inactive);
    }

    #[tokio::test]
    async fn update_role_and_status() {
        let db = test_db().await;
        let repo = db.employees();

        let mut emp = repo.create(cashier("Asha")).await.unwrap();
        emp.role = EmployeeRole::InventoryManager;
        emp.department = "Inventory".to_string();
        emp.salary = Some(Money::from_major(22_000));
        repo.update(&emp).await.unwrap();

        let fetched = repo.get_by_id(emp.id).await.unwrap().unwrap();
        assert_eq!(fetched.role, EmployeeRole::InventoryManager);
        assert_eq!(fetched.salary, Some(Money::from_major(22_000)));
    }

    #[tokio::test]
    async fn statistics_counts_active_only_salary() {
        let db = test_db().await;
        let repo = db.employees();

        let a = repo.create(cashier("Asha")).await.unwrap();
        repo.create(cashier("Binu")).await.unwrap();
        repo.soft_delete(a.id).await.unwrap();

        let stats = repo.statistics().await.unwrap();
        assert_eq!(stats.total_employees, 2);
        assert_eq!(stats.active_employees, 1);
        assert_eq!(stats.total_salary, Money::from_major(18_000));
    }
}
