//! # Catalog
//!
//! Products and their sellable variants (size, gauge, finish).
//! Stock lives on the variant and is measured in the variant's unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::validation::{
    validate_item_count, validate_non_negative_cents, validate_optional_text,
    validate_required_text, validate_sku, ValidationResult,
};
use crate::error::ValidationError;

/// A product family, e.g. "Thép hộp mạ kẽm".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Default unit for the family (m, kg, cây, tấm).
    pub unit: String,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

/// A sellable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub stock: f64,
    /// Overrides the product unit when set.
    pub unit: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ProductVariant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Variant joined with its product's display fields, used to fill line snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct VariantSnapshot {
    pub variant_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub variant_name: String,
    pub unit: String,
}

/// Payload for creating a product together with its variants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub variants: Vec<NewVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewVariant {
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required_text("name", &self.name, 200)?;
        validate_required_text("unit", &self.unit, 20)?;
        validate_optional_text("notes", self.notes.as_deref(), 1000)?;

        if self.variants.is_empty() {
            return Err(ValidationError::Required {
                field: "variants".to_string(),
            });
        }
        validate_item_count(self.variants.len())?;

        self.variants
            .iter()
            .enumerate()
            .try_for_each(|(i, variant)| variant.validate_fields(&format!("variants[{}].", i)))
    }
}

impl NewVariant {
    /// Validates a variant added to an existing product.
    pub fn validate(&self) -> ValidationResult<()> {
        self.validate_fields("")
    }

    fn validate_fields(&self, prefix: &str) -> ValidationResult<()> {
        validate_required_text(&format!("{}name", prefix), &self.name, 200)?;
        validate_sku(&self.sku)?;
        validate_non_negative_cents(&format!("{}price_cents", prefix), self.price_cents)?;
        if !self.stock.is_finite() || self.stock < 0.0 {
            return Err(ValidationError::MustNotBeNegative {
                field: format!("{}stock", prefix),
            });
        }
        validate_optional_text(&format!("{}unit", prefix), self.unit.as_deref(), 20)
    }
}

/// Partial product update. Absent fields are left unchanged.
///
/// Renames never touch documents already issued; their lines keep the
/// names copied at the time of sale or import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_required_text("name", name, 200)?;
        }
        if let Some(unit) = &self.unit {
            validate_required_text("unit", unit, 20)?;
        }
        validate_optional_text("notes", self.notes.as_deref(), 1000)
    }
}

/// Partial variant update. Absent fields are left unchanged.
///
/// Stock is not editable here; it only moves through invoices and approved
/// import orders so every change has a movement row.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct UpdateVariant {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price_cents: Option<i64>,
    pub unit: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateVariant {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_required_text("name", name, 200)?;
        }
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(price) = self.price_cents {
            validate_non_negative_cents("price_cents", price)?;
        }
        validate_optional_text("unit", self.unit.as_deref(), 20)
    }
}

/// Query for the product listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ProductQuery {
    /// Matches product name or variant SKU.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> NewProduct {
        NewProduct {
            name: "Thép hộp mạ kẽm".into(),
            unit: "cây".into(),
            notes: None,
            variants: vec![NewVariant {
                name: "40x80 dày 1.4".into(),
                sku: "HOP-40X80-14".into(),
                price_cents: 32_500_000,
                stock: 12.0,
                unit: None,
            }],
        }
    }

    #[test]
    fn test_valid_product() {
        assert!(product().validate().is_ok());
    }

    #[test]
    fn test_product_requires_variants() {
        let mut p = product();
        p.variants.clear();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let mut p = product();
        p.variants[0].stock = -1.0;
        assert!(matches!(
            p.validate(),
            Err(ValidationError::MustNotBeNegative { ref field }) if field == "variants[0].stock"
        ));

        let variant = NewVariant {
            stock: f64::NAN,
            ..p.variants[0].clone()
        };
        assert!(matches!(
            variant.validate(),
            Err(ValidationError::MustNotBeNegative { ref field }) if field == "stock"
        ));
    }

    #[test]
    fn test_updates_validate_only_present_fields() {
        assert!(UpdateProduct::default().validate().is_ok());
        assert!(UpdateProduct {
            name: Some("  ".into()),
            ..UpdateProduct::default()
        }
        .validate()
        .is_err());

        assert!(UpdateVariant {
            name: Some("40x80 dày 1.8".into()),
            price_cents: Some(34_000_000),
            ..UpdateVariant::default()
        }
        .validate()
        .is_ok());
        assert!(UpdateVariant {
            sku: Some("HOP 40".into()),
            ..UpdateVariant::default()
        }
        .validate()
        .is_err());
        assert!(UpdateVariant {
            price_cents: Some(-1),
            ..UpdateVariant::default()
        }
        .validate()
        .is_err());
    }
}
