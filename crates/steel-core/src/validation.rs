//! # Validation Module
//!
//! Input validation utilities for Steel POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (apps/api)                                   │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── quantities > 0, prices ≥ 0, percentages 0..=100                   │
//! │  └── runs BEFORE any transaction is opened                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE and foreign key constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use steel_core::validation::{validate_quantity, validate_percentage};
//!
//! assert!(validate_quantity("quantity", 2.5).is_ok());
//! assert!(validate_percentage("discount_percentage", 120.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT_CENTS, MAX_DOCUMENT_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field with a length cap.
///
/// ## Example
/// ```rust
/// use steel_core::validation::validate_required_text;
///
/// assert!(validate_required_text("customer_name", "Nguyen Van A", 200).is_ok());
/// assert!(validate_required_text("customer_name", "   ", 200).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text field: absent is fine, present is capped.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a customer phone number.
///
/// ## Rules
/// - Must not be empty
/// - Digits plus `+`, spaces, dashes, dots and parentheses
/// - At most 20 characters
///
/// ## Example
/// ```rust
/// use steel_core::validation::validate_phone;
///
/// assert!(validate_phone("0901 234 567").is_ok());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    validate_required_text("customer_phone", phone, 20)?;

    let valid = phone
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')'));
    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "customer_phone".to_string(),
            reason: "must contain only digits and + - . ( ) characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty, at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    validate_required_text("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity: finite, strictly positive, bounded.
///
/// ## Example
/// ```rust
/// use steel_core::validation::validate_quantity;
///
/// assert!(validate_quantity("quantity", 0.5).is_ok());
/// assert!(validate_quantity("quantity", 0.0).is_err());
/// assert!(validate_quantity("quantity", f64::NAN).is_err());
/// ```
pub fn validate_quantity(field: &str, quantity: f64) -> ValidationResult<()> {
    if !quantity.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0.0,
        max: MAX_AMOUNT_CENTS as f64,
    }
}

/// Validates a money amount that may be zero but never negative,
/// and at most [`MAX_AMOUNT_CENTS`].
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(amount_out_of_range(field));
    }
    Ok(())
}

/// Validates a payment amount (must be strictly positive).
///
/// ## Example
/// ```rust
/// use steel_core::validation::validate_payment_amount;
///
/// assert!(validate_payment_amount(10_000).is_ok());
/// assert!(validate_payment_amount(0).is_err());
/// ```
pub fn validate_payment_amount(amount_cents: i64) -> ValidationResult<()> {
    if amount_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount_cents".to_string(),
        });
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(amount_out_of_range("amount_cents"));
    }
    Ok(())
}

/// Checks a computed amount (line total, running balance).
///
/// `None` stands for an arithmetic overflow and is rejected like any amount
/// outside `0..=MAX_AMOUNT_CENTS`.
pub fn bounded_amount(field: &str, amount: Option<Money>) -> ValidationResult<Money> {
    match amount {
        Some(amount) if (0..=MAX_AMOUNT_CENTS).contains(&amount.cents()) => Ok(amount),
        _ => Err(amount_out_of_range(field)),
    }
}

/// Sums amounts, failing as soon as the running total leaves the allowed range.
///
/// ## Example
/// ```rust
/// use steel_core::validation::checked_total;
/// use steel_core::{Money, MAX_AMOUNT_CENTS};
///
/// let parts = [Money::from_cents(1_000), Money::from_cents(250)];
/// assert_eq!(checked_total("subtotal_cents", parts).unwrap().cents(), 1_250);
///
/// let huge = [Money::from_cents(MAX_AMOUNT_CENTS), Money::from_cents(1)];
/// assert!(checked_total("subtotal_cents", huge).is_err());
/// ```
pub fn checked_total(field: &str, amounts: impl IntoIterator<Item = Money>) -> ValidationResult<Money> {
    amounts
        .into_iter()
        .try_fold(Money::zero(), |total, amount| bounded_amount(field, total.checked_add(amount)))
}

/// Validates a decimal percentage (0 to 100 inclusive).
pub fn validate_percentage(field: &str, pct: f64) -> ValidationResult<()> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

/// Validates the number of lines on an invoice or import order.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_DOCUMENT_ITEMS {
        return Err(ValidationError::InvalidCount {
            field: "items".to_string(),
            min: 1,
            max: MAX_DOCUMENT_ITEMS,
        });
    }

    Ok(())
}

/// Validates a search query string.
///
/// Returns the trimmed query, or `None` when it is blank.
pub fn validate_search_query(query: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(Some(query.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("name", "Thép hộp 40x80", 200).is_ok());
        assert!(matches!(
            validate_required_text("name", "", 200),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_required_text("name", &"x".repeat(201), 200),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text("notes", None, 10).is_ok());
        assert!(validate_optional_text("notes", Some("short"), 10).is_ok());
        assert!(validate_optional_text("notes", Some("much too long"), 10).is_err());
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("+84 901-234-567").is_ok());
        assert!(validate_phone("(028) 3822.1234").is_ok());
        assert!(validate_phone("").is_err());
        assert!(validate_phone("090abc").is_err());
    }

    #[test]
    fn test_sku() {
        assert!(validate_sku("TH-40X80-1.2").is_err());
        assert!(validate_sku("TH-40X80_12").is_ok());
        assert!(validate_sku("").is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity("quantity", 1.0).is_ok());
        assert!(validate_quantity("quantity", 0.25).is_ok());
        assert!(validate_quantity("quantity", 0.0).is_err());
        assert!(validate_quantity("quantity", -1.0).is_err());
        assert!(validate_quantity("quantity", f64::INFINITY).is_err());
        assert!(validate_quantity("quantity", MAX_ITEM_QUANTITY + 1.0).is_err());
    }

    #[test]
    fn test_money_amounts() {
        assert!(validate_non_negative_cents("unit_price_cents", 0).is_ok());
        assert!(validate_non_negative_cents("unit_price_cents", -1).is_err());
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-100).is_err());
    }

    #[test]
    fn test_amounts_are_bounded() {
        assert!(validate_non_negative_cents("unit_price_cents", MAX_AMOUNT_CENTS).is_ok());
        assert!(matches!(
            validate_non_negative_cents("unit_price_cents", MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_payment_amount(i64::MAX),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "amount_cents"
        ));
    }

    #[test]
    fn test_checked_total_rejects_overflow() {
        let half = Money::from_cents(i64::MAX / 2 + 1);
        assert!(matches!(
            checked_total("subtotal_cents", [half, half]),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "subtotal_cents"
        ));
        assert!(bounded_amount("total_cents", None).is_err());
        assert!(bounded_amount("total_cents", Some(Money::from_cents(-1))).is_err());
        assert_eq!(checked_total("subtotal_cents", []).unwrap(), Money::zero());
    }

    #[test]
    fn test_percentage() {
        assert!(validate_percentage("tax_percentage", 0.0).is_ok());
        assert!(validate_percentage("tax_percentage", 100.0).is_ok());
        assert!(validate_percentage("tax_percentage", 100.01).is_err());
        assert!(validate_percentage("tax_percentage", -5.0).is_err());
        assert!(validate_percentage("tax_percentage", f64::NAN).is_err());
    }

    #[test]
    fn test_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(MAX_DOCUMENT_ITEMS).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(MAX_DOCUMENT_ITEMS + 1).is_err());
    }

    #[test]
    fn test_search_query() {
        assert_eq!(validate_search_query(None).unwrap(), None);
        assert_eq!(validate_search_query(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_search_query(Some("  INV-0001 ")).unwrap(),
            Some("INV-0001".to_string())
        );
        assert!(validate_search_query(Some(&"a".repeat(101))).is_err());
    }
}
