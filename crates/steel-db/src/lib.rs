//! # steel-db: Database Layer for Steel POS
//!
//! This crate provides database access for the Steel POS back office.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Steel POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /invoices)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     steel-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ InvoiceRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PaymentRepo   │    │ 001_init.sql │  │   │
//! │  │   │               │    │ ImportRepo    │    │              │  │   │
//! │  │   │               │    │ AuditLogRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DATABASE_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use steel_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./steel-pos.db")).await?;
//! let invoice = db.invoices().create(request, &actor).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::AuditLogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::import_order::ImportOrderRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
