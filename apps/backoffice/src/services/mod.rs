//! Back-office services: the glue the panels call.

pub mod backup;
pub mod checkout;
pub mod notify;
pub mod reports;
