//! # Route Handlers
//!
//! ```text
//! routes/
//! ├── mod.rs            ◄─── You are here (shared query types)
//! ├── health.rs         ◄─── Liveness + database probe
//! ├── customers.rs      ◄─── Customer directory
//! ├── products.rs       ◄─── Catalog, variant movement log
//! ├── invoices.rs       ◄─── Invoice aggregate, summary, print
//! ├── payments.rs       ◄─── Payment ledger
//! ├── audit_logs.rs     ◄─── Audit trail
//! └── import_orders.rs  ◄─── Purchasing + approval
//! ```
//!
//! Handlers stay thin: authorize, call one repository operation, wrap the
//! result in the envelope. Transactions live in steel-db.

use serde::Deserialize;
use steel_core::PageRequest;

pub mod audit_logs;
pub mod customers;
pub mod health;
pub mod import_orders;
pub mod invoices;
pub mod payments;
pub mod products;

/// `?page=&limit=` for endpoints without other filters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(query.page, query.limit)
    }
}
