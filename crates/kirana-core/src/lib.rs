//! # kirana-core: Pure Business Logic for Kirana POS
//!
//! This crate is the **heart** of Kirana POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kirana POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Back Office App (apps/backoffice)              │   │
//! │  │    Session ──► Cart ──► Checkout ──► Reports ──► CSV export     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kirana-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  checkout │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CartLine  │  │   rules   │  │   │
//! │  │   │ Customer  │  │  RateBps  │  │  Totals   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kirana-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Transaction, etc.)
//! - [`money`] - Fixed-point money type (no floating point!)
//! - [`checkout`] - Billing arithmetic (line amounts, totals, loyalty)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are fixed-point i64, four decimals
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kirana_core::Money` instead of
// `use kirana_core::money::Money`

pub use checkout::{BillingPolicy, CartLine, LineAmounts, TransactionTotals};
pub use error::{CoreError, ValidationError};
pub use money::{Money, RateBps};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate applied on the billing path, in basis points (1800 = 18% GST).
///
/// Product records carry their own `tax_rate_bps`, but the checkout flow
/// bills every line at this rate. Overridable through [`BillingPolicy`].
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;

/// Currency units spent per loyalty point earned.
///
/// A completed sale of 250.00 earns 25 points.
pub const LOYALTY_SPEND_PER_POINT: i64 = 10;

/// Maximum distinct items allowed in a single cart.
///
/// Prevents runaway carts in the billing panel. The billing math itself
/// places no limit.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// Guards against typos (1000 instead of 10) at the point of entry.
pub const MAX_ITEM_QUANTITY: i64 = 999;
