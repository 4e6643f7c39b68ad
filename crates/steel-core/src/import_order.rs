//! # Import Orders
//!
//! Purchasing documents from suppliers. Approval is one-way
//! (`pending → approved`) and is the only path that raises variant stock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::validation::{
    bounded_amount, checked_total, validate_item_count, validate_non_negative_cents, validate_optional_text,
    validate_quantity, validate_required_text, ValidationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    Approved,
}

impl ImportStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Approved => "approved",
        }
    }
}

/// Message used whenever a non-pending order is mutated.
pub const NOT_PENDING: &str = "Import order is not in pending status";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ImportOrder {
    pub id: i64,
    /// Human-readable code, e.g. `IMP-000007`.
    pub import_code: String,
    pub supplier_name: String,
    #[ts(as = "String")]
    pub import_date: DateTime<Utc>,
    pub total_cents: i64,
    pub status: ImportStatus,
    pub notes: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_by_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_note: Option<String>,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<ImportOrderItem>,
}

impl ImportOrder {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Approved orders are immutable.
    pub fn ensure_pending(&self) -> CoreResult<()> {
        if self.status != ImportStatus::Pending {
            return Err(CoreError::conflict(NOT_PENDING));
        }
        Ok(())
    }

    /// Structured snapshot for the audit trail.
    pub fn snapshot(&self) -> Value {
        json!({
            "id": self.id,
            "import_code": self.import_code,
            "supplier_name": self.supplier_name,
            "import_date": self.import_date,
            "status": self.status.as_str(),
            "notes": self.notes,
            "approval_note": self.approval_note,
            "total_amount": self.total().to_major(),
            "items": self.items.iter().map(|item| json!({
                "product_id": item.product_id,
                "variant_id": item.variant_id,
                "product_name": item.product_name,
                "quantity": item.quantity,
                "unit_price": Money::from_cents(item.unit_price_cents).to_major(),
            })).collect::<Vec<_>>(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ImportOrderItem {
    pub id: i64,
    pub import_order_id: i64,
    pub product_id: i64,
    pub variant_id: i64,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
    pub notes: Option<String>,
}

/// A requested import line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImportLine {
    pub product_id: i64,
    pub variant_id: i64,
    pub quantity: f64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ImportLine {
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }
}

fn validate_import_lines(lines: &[ImportLine]) -> ValidationResult<()> {
    validate_item_count(lines.len())?;
    for (i, line) in lines.iter().enumerate() {
        validate_quantity(&format!("items[{}].quantity", i), line.quantity)?;
        validate_non_negative_cents(&format!("items[{}].unit_price_cents", i), line.unit_price_cents)?;
        bounded_amount(
            &format!("items[{}].total_price_cents", i),
            Money::from_cents(line.unit_price_cents).checked_multiply_quantity(line.quantity),
        )?;
        validate_optional_text(&format!("items[{}].notes", i), line.notes.as_deref(), 500)?;
    }
    import_total(lines).map(|_| ())
}

/// Sum of `round(quantity × unit_price)` over the lines.
pub fn import_total(lines: &[ImportLine]) -> ValidationResult<Money> {
    checked_total("total_cents", lines.iter().map(ImportLine::line_total))
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateImportOrderRequest {
    pub supplier_name: String,
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub import_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<ImportLine>,
}

impl CreateImportOrderRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required_text("supplier_name", &self.supplier_name, 200)?;
        validate_optional_text("notes", self.notes.as_deref(), 2000)?;
        validate_import_lines(&self.items)
    }
}

/// Partial update of a pending order. `items` replaces all lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct UpdateImportOrderRequest {
    pub supplier_name: Option<String>,
    #[ts(as = "Option<String>")]
    pub import_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub items: Option<Vec<ImportLine>>,
}

impl UpdateImportOrderRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.supplier_name {
            validate_required_text("supplier_name", name, 200)?;
        }
        validate_optional_text("notes", self.notes.as_deref(), 2000)?;
        if let Some(items) = &self.items {
            validate_import_lines(items)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ApproveImportOrderRequest {
    pub approval_note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ImportOrderFilter {
    pub status: Option<ImportStatus>,
    /// Matches import code or supplier name.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
