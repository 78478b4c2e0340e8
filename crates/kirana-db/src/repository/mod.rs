//! # Repository Layer
//!
//! One repository per entity. Each repository owns a clone of the pool and
//! exposes the operations the back-office panels call.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product     CRUD, FTS search, stock adjustment, low-stock/expiring    │
//! │  customer    CRUD, phone lookup, loyalty, purchase history             │
//! │  employee    CRUD, role queries, soft delete via status                │
//! │  supplier    CRUD                                                      │
//! │  user        login accounts, argon2 hashing, authentication            │
//! │  transaction the checkout flow (the only multi-statement unit),        │
//! │              refunds, recent/details queries                           │
//! │  inventory   append-only movement log                                  │
//! │  settings    typed key/value settings, billing policy loader           │
//! │  audit       who-did-what log                                          │
//! │  report      canned report queries                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod category;
pub mod customer;
pub mod employee;
pub mod inventory;
pub mod product;
pub mod report;
pub mod settings;
pub mod supplier;
pub mod transaction;
pub mod user;
