//! # Inventory Movement Log
//!
//! Append-only record of stock changes tied to the document that caused them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoice created   ──► one `sale` row per variant-bound line            │
//! │                        quantity_change < 0, stock untouched (log only)  │
//! │                                                                         │
//! │  import approved   ──► one `import` row per line                        │
//! │                        quantity_change > 0, stock += quantity,          │
//! │                        previous/new stock recorded                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::import_order::ImportOrderItem;
use crate::invoice::InvoiceLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Sale,
    Import,
}

/// Kind of document a movement points back to.
pub mod reference {
    pub const INVOICE: &str = "invoice";
    pub const IMPORT_ORDER: &str = "import_order";
}

/// A stored movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: Option<i64>,
    pub variant_id: i64,
    pub movement_type: MovementType,
    /// Signed: negative for sales, positive for imports.
    pub quantity_change: f64,
    pub previous_stock: Option<f64>,
    pub new_stock: Option<f64>,
    pub reference_type: String,
    pub reference_id: i64,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A movement about to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub product_id: Option<i64>,
    pub variant_id: i64,
    pub movement_type: MovementType,
    pub quantity_change: f64,
    pub previous_stock: Option<f64>,
    pub new_stock: Option<f64>,
    pub reference_type: &'static str,
    pub reference_id: i64,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
}

impl NewMovement {
    /// Sale movement for an invoice line. Lines without a variant are not
    /// tracked and yield `None`.
    pub fn sale(line: &InvoiceLine, invoice_id: i64, invoice_code: &str, created_by: Option<i64>) -> Option<Self> {
        let variant_id = line.variant_id?;
        Some(NewMovement {
            product_id: line.product_id,
            variant_id,
            movement_type: MovementType::Sale,
            quantity_change: -line.quantity,
            previous_stock: None,
            new_stock: None,
            reference_type: reference::INVOICE,
            reference_id: invoice_id,
            notes: Some(format!("Sold on invoice {}", invoice_code)),
            created_by,
        })
    }

    /// Import movement for an approved order line, with the stock it moved.
    pub fn import(
        item: &ImportOrderItem,
        import_code: &str,
        previous_stock: f64,
        created_by: Option<i64>,
    ) -> Self {
        NewMovement {
            product_id: Some(item.product_id),
            variant_id: item.variant_id,
            movement_type: MovementType::Import,
            quantity_change: item.quantity,
            previous_stock: Some(previous_stock),
            new_stock: Some(previous_stock + item.quantity),
            reference_type: reference::IMPORT_ORDER,
            reference_id: item.import_order_id,
            notes: Some(format!("Received on import order {}", import_code)),
            created_by,
        }
    }
}
