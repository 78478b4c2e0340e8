//! Shared fixtures for repository tests. Compiled only under `cfg(test)`.

use kirana_core::{EmployeeRole, Money};

use crate::pool::{Database, DbConfig};
use crate::repository::customer::NewCustomer;
use crate::repository::employee::NewEmployee;
use crate::repository::product::NewProduct;

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Minimal product payload.
pub(crate) fn new_product(name: &str, price_major: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        unit_price: Money::from_major(price_major),
        quantity_in_stock: stock,
        max_stock_level: 1000,
        ..NewProduct::default()
    }
}

/// Inserts an employee row (FK target for transactions and movements).
pub(crate) async fn seed_employee(db: &Database) -> i64 {
    db.employees()
        .create(NewEmployee {
            name: "Test Clerk".to_string(),
            role: EmployeeRole::Cashier,
            ..NewEmployee::default()
        })
        .await
        .unwrap()
        .id
}

/// Inserts a customer row and returns its id.
pub(crate) async fn seed_customer(db: &Database, name: &str, phone: &str) -> i64 {
    db.customers()
        .create(NewCustomer {
            name: name.to_string(),
            phone: phone.to_string(),
            ..NewCustomer::default()
        })
        .await
        .unwrap()
        .id
}
