//! # Error Types
//!
//! Domain-specific error types for steel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  steel-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule failures (not found, conflict)   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  steel-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  REST errors (apps/api)                                                │
//! │  └── ApiError         - What the client sees (JSON envelope)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// - Invoice creation names a `customer_id` that is not in the directory
    /// - An import order line points at a variant that was never created
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The entity is in a state that forbids the operation.
    ///
    /// ## When This Occurs
    /// - Approving an import order twice
    /// - Registering a payment against a cancelled invoice
    ///
    /// ## User Workflow
    /// ```text
    /// Approve IMP-000012 (already approved)
    ///      │
    ///      ▼
    /// Conflict("Import order is not in pending status")
    ///      │
    ///      ▼
    /// HTTP 409
    /// ```
    #[error("{0}")]
    Conflict(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a not-found error on an integer identifier.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// They are raised before any write so nothing is partially persisted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. non-finite number, bad characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection had too few or too many entries.
    #[error("{field} must contain between {min} and {max} entries")]
    InvalidCount { field: String, min: usize, max: usize },

    /// Discount larger than the amount it applies to.
    #[error("discount {discount_cents} exceeds subtotal {subtotal_cents}")]
    DiscountExceedsSubtotal {
        discount_cents: i64,
        subtotal_cents: i64,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Invoice", 42);
        assert_eq!(err.to_string(), "Invoice not found: 42");

        let err = CoreError::conflict("Import order is not in pending status");
        assert_eq!(err.to_string(), "Import order is not in pending status");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items is required");

        let err = ValidationError::MustNotBeNegative {
            field: "items[0].unit_price_cents".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "items[0].unit_price_cents must not be negative"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer_phone".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
