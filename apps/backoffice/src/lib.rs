//! # Kirana Back Office
//!
//! Application layer for Kirana POS: everything the desktop panels call,
//! minus the widgets. Each module corresponds to a panel concern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Panel              Module here                                        │
//! │  ─────              ───────────                                        │
//! │  Login              session (authenticate, role-gated panels)          │
//! │  Billing            cart + services::checkout                          │
//! │  Inventory          kirana-db product repository (direct)              │
//! │  Customers          kirana-db customer repository (direct)             │
//! │  Employees          kirana-db employee repository (direct)             │
//! │  Reports            services::reports (+ CSV export)                   │
//! │  Administration     kirana-db user/settings/audit repos, backup        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The binary (`main.rs`) wires configuration, logging and the CLI entry
//! points (setup, backup, report dumps).

pub mod cart;
pub mod config;
pub mod error;
pub mod services;
pub mod session;

pub use config::AppConfig;
pub use error::{AppError, ErrorCode};
pub use session::{Panel, Session};
