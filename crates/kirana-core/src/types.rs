//! # Domain Types
//!
//! Core domain types used throughout Kirana POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  Transaction    │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (i64)       │   │  id (i64)       │   │  id (i64)       │       │
//! │  │  product_code   │   │  txn_number     │   │  phone (unique) │       │
//! │  │  unit_price     │   │  total_amount   │   │  loyalty_points │       │
//! │  │  stock levels   │   │  payment status │   │  membership     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Plus: Employee, Supplier, User, Category, TransactionItem,            │
//! │        InventoryMovement, AuditLog, SystemSetting                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Most entities have:
//! - `id`: integer primary key (AUTOINCREMENT) - used for relations
//! - Business code: (product_code, employee_code, phone) - human-readable
//!
//! ## Soft Delete
//! Rows are marked inactive (`is_active` / `status`) instead of removed, to
//! preserve referential history in transactions and movements.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, RateBps};

// =============================================================================
// Role & Status Enums
// =============================================================================

/// Role of a login account. Gates which back-office panels are reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Cashier,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Cashier => "cashier",
        }
    }
}

/// Role of an employee record (distinct from login accounts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Admin,
    Manager,
    Cashier,
    InventoryManager,
}

impl Default for EmployeeRole {
    fn default() -> Self {
        EmployeeRole::Cashier
    }
}

impl EmployeeRole {
    /// Default department for a role, used when the form leaves it blank.
    pub const fn default_department(&self) -> &'static str {
        match self {
            EmployeeRole::Admin => "Management",
            EmployeeRole::Manager => "Management",
            EmployeeRole::Cashier => "Sales",
            EmployeeRole::InventoryManager => "Inventory",
        }
    }
}

/// Employment status. Inactive is the soft-delete state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

/// Customer membership tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    Regular,
    Silver,
    Gold,
    Platinum,
}

impl Default for MembershipTier {
    fn default() -> Self {
        MembershipTier::Regular
    }
}

// =============================================================================
// Transaction Enums
// =============================================================================

/// Kind of transaction recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Sale,
    Return,
    Exchange,
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Credit,
    LoyaltyPoints,
    Mixed,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Credit => "credit",
            PaymentMethod::LoyaltyPoints => "loyalty_points",
            PaymentMethod::Mixed => "mixed",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// Settlement state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
    Cancelled,
    Partial,
}

// =============================================================================
// Inventory Enums
// =============================================================================

/// Direction/kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    Transfer,
    Damaged,
    Expired,
}

/// What caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Purchase,
    Sale,
    Return,
    Adjustment,
    Transfer,
    Waste,
}

/// Declared type of a system setting value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    String,
    Integer,
    Decimal,
    Boolean,
    Json,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Integer primary key.
    pub id: i64,

    /// Business identifier, unique (e.g. "PRD-20260115-0042").
    pub product_code: String,

    /// Scannable barcode, unique when present.
    pub barcode: Option<String>,

    /// Display name shown in the inventory panel and on receipts.
    pub name: String,

    pub description: Option<String>,

    /// Category foreign key (SET NULL on category delete).
    pub category_id: Option<i64>,

    /// Supplier foreign key (SET NULL on supplier delete).
    pub supplier_id: Option<i64>,

    pub brand: Option<String>,

    /// Unit of sale ("piece", "kg", "litre").
    pub unit: String,

    /// Selling price per unit.
    pub unit_price: Money,

    /// Purchase cost per unit, for margin and valuation reports.
    pub cost_price: Option<Money>,

    /// Maximum retail price, when printed on the package.
    pub mrp: Option<Money>,

    /// Standing discount for this product, in basis points.
    pub discount_rate_bps: u32,

    /// Tax rate carried on the record, in basis points. The billing path
    /// applies the configured GST rate instead.
    pub tax_rate_bps: u32,

    /// Current stock level. Never driven negative by the checkout flow.
    pub quantity_in_stock: i64,

    pub min_stock_level: i64,
    pub max_stock_level: i64,

    /// Stock threshold below which the product is flagged for restocking.
    pub reorder_level: i64,

    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub rack_location: Option<String>,

    /// Soft-delete flag.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Standing discount rate.
    #[inline]
    pub fn discount_rate(&self) -> RateBps {
        RateBps::from_bps(self.discount_rate_bps)
    }

    /// Tax rate carried on the record.
    #[inline]
    pub fn tax_rate(&self) -> RateBps {
        RateBps::from_bps(self.tax_rate_bps)
    }

    /// Unit price after the standing discount.
    pub fn discounted_price(&self) -> Money {
        self.unit_price - self.unit_price.apply_rate(self.discount_rate())
    }

    /// Discount amount per unit.
    pub fn discount_amount(&self) -> Money {
        self.unit_price.apply_rate(self.discount_rate())
    }

    /// Whether the requested quantity can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity_in_stock >= quantity
    }

    /// True when stock has fallen to the reorder level or the given floor.
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity_in_stock <= self.reorder_level.max(threshold)
    }

    /// True when the product expires within `days` of `today`.
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        match self.expiry_date {
            Some(expiry) => {
                let until = (expiry - today).num_days();
                until <= days
            }
            None => false,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer. Identity is the phone number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub customer_code: Option<String>,
    pub name: String,

    /// Unique phone number; the lookup key at the billing counter.
    pub phone: String,

    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub date_of_birth: Option<NaiveDate>,

    pub membership_tier: MembershipTier,

    /// Reward counter, accrued by the checkout flow.
    pub loyalty_points: i64,

    /// Cumulative spend, incremented by the checkout flow.
    pub total_purchases: Money,

    pub registration_date: NaiveDate,
    pub last_visit: Option<DateTime<Utc>>,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Employee
// =============================================================================

/// An employee record (payroll/staffing, distinct from login accounts).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,

    /// Unique business code (e.g. "EMP1042").
    pub employee_code: String,

    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,

    pub role: EmployeeRole,
    pub department: String,

    pub salary: Option<Money>,
    pub hire_date: NaiveDate,

    /// Soft delete: inactive employees stay for transaction history.
    pub status: EmployeeStatus,

    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Whole years since the hire date.
    pub fn years_of_service(&self, today: NaiveDate) -> i64 {
        ((today - self.hire_date).num_days() / 365).max(0)
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A product supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
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
    pub outstanding_amount: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A login account.
///
/// The password hash never leaves the database layer; this struct is what
/// authentication returns to the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Categories form a tree via `parent_category_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_category_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A sale transaction header.
///
/// Aggregates equal the sum of item-level aggregates by construction; no
/// database check enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: i64,

    /// Generated unique number: `TXN-{timestamp}-{random}`.
    pub transaction_number: String,

    pub customer_id: Option<i64>,
    pub employee_id: i64,
    pub transaction_date: DateTime<Utc>,
    pub transaction_type: TransactionType,

    /// Sum of `original_price × quantity` over kept lines.
    pub subtotal: Money,

    /// Item-level discounts plus the order-level threshold discount.
    pub discount_amount: Money,

    /// Sum of item tax amounts.
    pub tax_amount: Money,

    /// `subtotal - discount_amount + tax_amount`.
    pub total_amount: Money,

    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,

    /// Points credited to the attached customer for this sale.
    pub loyalty_points_earned: i64,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line within a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    pub quantity: i64,

    /// Unit price after the line discount.
    pub unit_price: Money,

    /// Unit price before the line discount.
    pub original_price: Money,

    pub discount_rate_bps: u32,
    pub discount_amount: Money,
    pub tax_rate_bps: u32,
    pub tax_amount: Money,

    /// `(original_price × qty − discount_amount) + tax_amount`.
    pub line_total: Money,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// One row per stock-affecting event. Append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,

    /// Always positive; direction comes from `movement_type`.
    pub quantity: i64,

    pub reference_type: ReferenceType,

    /// Id of the causing row (transaction id for sales/returns).
    pub reference_id: Option<i64>,

    pub reason: Option<String>,
    pub employee_id: i64,
    pub movement_date: DateTime<Utc>,
}

// =============================================================================
// Audit Log
// =============================================================================

/// A record of who did what, written by login and admin operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub table_name: Option<String>,
    pub record_id: Option<i64>,

    /// Free-form JSON payload with before/after context.
    pub details: Option<String>,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// System Setting
// =============================================================================

/// A key/value configuration row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SystemSetting {
    pub id: i64,
    pub setting_key: String,
    pub setting_value: Option<String>,
    pub data_type: SettingType,
    pub description: Option<String>,
    pub category: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: 1,
            product_code: "PRD-TEST-0001".to_string(),
            barcode: None,
            name: "Sunflower Oil 1L".to_string(),
            description: None,
            category_id: None,
            supplier_id: None,
            brand: None,
            unit: "piece".to_string(),
            unit_price: Money::from_major(120),
            cost_price: Some(Money::from_major(95)),
            mrp: Some(Money::from_major(130)),
            discount_rate_bps: 1000, // 10%
            tax_rate_bps: 1800,
            quantity_in_stock: 8,
            min_stock_level: 2,
            max_stock_level: 100,
            reorder_level: 5,
            expiry_date: NaiveDate::from_ymd_opt(2026, 9, 1),
            manufacturing_date: None,
            batch_number: None,
            rack_location: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn discounted_price() {
        let p = sample_product();
        // 120.00 less 10% = 108.0000
        assert_eq!(p.discounted_price(), Money::from_major(108));
        assert_eq!(p.discount_amount(), Money::from_major(12));
    }

    #[test]
    fn stock_checks() {
        let p = sample_product();
        assert!(p.can_sell(8));
        assert!(!p.can_sell(9));

        // reorder_level is 5, stock 8: not low against the default floor
        assert!(!p.is_low_stock(3));
        // a higher configured floor wins
        assert!(p.is_low_stock(10));
    }

    #[test]
    fn expiry_window() {
        let p = sample_product();
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(p.expires_within(today, 7));
        let earlier = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        assert!(!p.expires_within(earlier, 7));
    }

    #[test]
    fn employee_service_years() {
        let now = Utc::now();
        let emp = Employee {
            id: 1,
            employee_code: "EMP1001".to_string(),
            name: "Asha".to_string(),
            phone: None,
            email: None,
            role: EmployeeRole::Cashier,
            department: "Sales".to_string(),
            salary: Some(Money::from_major(18_000)),
            hire_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
            status: EmployeeStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        let today = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(emp.years_of_service(today), 4);
    }

    #[test]
    fn role_departments() {
        assert_eq!(EmployeeRole::Cashier.default_department(), "Sales");
        assert_eq!(EmployeeRole::InventoryManager.default_department(), "Inventory");
    }
}
