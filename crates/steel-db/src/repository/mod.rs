//! # Repository Module
//!
//! Database repository implementations for Steel POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.invoices().create(request, &actor)                         │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── create(&self, request, actor)   ─┐                                │
//! │  ├── update(&self, id, request, ...)  │  one transaction each:         │
//! │  └── delete(&self, id, actor)        ─┘  rows + movements + audit      │
//! │       │                                                                 │
//! │       │  SQL (runtime-checked, bound parameters)                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories own their SQL. Statements that must join a caller's      │
//! │  transaction are `pub(crate)` functions taking `&mut SqliteConnection`.│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Transactions
//! Every unit of work opens with a write (the code sequence bump or a
//! touch of the parent row). SQLite then holds the write lock for the whole
//! transaction, so concurrent ledger writes on one invoice serialize instead
//! of failing on a read-to-write lock upgrade.
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer directory
//! - [`ProductRepository`](product::ProductRepository) - Products and variants
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Invoice aggregate
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment ledger
//! - [`InventoryRepository`](inventory::InventoryRepository) - Movement log
//! - [`ImportOrderRepository`](import_order::ImportOrderRepository) - Purchasing
//! - [`AuditLogRepository`](audit::AuditLogRepository) - Audit trail

pub mod audit;
pub mod customer;
pub mod import_order;
pub mod inventory;
pub mod invoice;
pub mod payment;
pub mod product;
pub mod sequence;

/// `%term%` pattern for LIKE searches.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term)
}
