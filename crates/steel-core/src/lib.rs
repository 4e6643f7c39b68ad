//! # steel-core: Pure Business Logic for Steel POS
//!
//! This crate holds the back-office rules of the steel/hardware store as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Steel POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum REST)                         │   │
//! │  │    /invoices ──► /invoice-payments ──► /audit-logs ──► ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               steel-db (repositories, transactions)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ steel-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  invoice  │  │   money   │  │   audit   │  │ validation│  │   │
//! │  │   │  totals   │  │   Money   │  │   diff    │  │   rules   │  │   │
//! │  │   │  status   │  │   Rate    │  │  summary  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (integer cents) and `Rate` (basis points)
//! - [`invoice`] - Invoice aggregate: totals, payment status, partial updates
//! - [`payment`] - Payment ledger rows and corrections
//! - [`audit`] - Audit entries and the deterministic change summary
//! - [`inventory`] - Movement log records
//! - [`import_order`] - Purchasing documents and their approval rule
//! - [`customer`], [`catalog`] - Reference entities
//! - [`types`] - Shared types (actor, pagination, code sequences)
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use steel_core::money::{Money, Rate};
//!
//! let subtotal = Money::from_cents(25_000);
//! let discount = subtotal.percentage(Rate::from_percentage(10.0));
//! assert_eq!(discount.cents(), 2_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod catalog;
pub mod customer;
pub mod error;
pub mod import_order;
pub mod inventory;
pub mod invoice;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items on a single invoice or import order.
///
/// ## Business Reason
/// Keeps documents printable and prevents runaway payloads.
pub const MAX_DOCUMENT_ITEMS: usize = 200;

/// Maximum quantity of a single line (meters, kilograms or pieces).
pub const MAX_ITEM_QUANTITY: f64 = 1_000_000.0;

/// Largest amount in cents accepted for a price, payment, line or document total.
///
/// Keeps every sum of bounded amounts far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000_000;

/// Payment method used when an upfront payment arrives without one.
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Upper bound on page size for list endpoints.
pub const MAX_PAGE_LIMIT: u32 = 100;
