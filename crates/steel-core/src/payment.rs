//! # Payment Ledger
//!
//! Payment rows recorded against an invoice, and the correction rule that
//! keeps the pre-correction amount on record.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register  ──► append confirmed row ──► invoice.paid += amount          │
//! │  correct   ──► mutate row, stamp who/when/why, keep original amount     │
//! │                 └─► invoice.paid = Σ confirmed                          │
//! │  delete    ──► remove row ──► invoice.paid = Σ confirmed                │
//! │                                                                         │
//! │  Invariant: invoice.paid == Σ amount of confirmed rows                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::validation::{validate_optional_text, validate_payment_amount, ValidationResult};

/// Status of a single ledger row. Only confirmed rows count toward the paid amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Confirmed,
    /// Kept for history, excluded from the paid amount.
    Voided,
}

impl Default for LedgerStatus {
    fn default() -> Self {
        LedgerStatus::Confirmed
    }
}

/// One payment against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoicePayment {
    pub id: i64,
    pub invoice_id: i64,
    pub amount_cents: i64,
    pub payment_method: String,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
    pub status: LedgerStatus,
    pub correction_reason: Option<String>,
    pub corrected_by: Option<i64>,
    #[ts(as = "Option<String>")]
    pub corrected_at: Option<DateTime<Utc>>,
    /// The amount before the first correction. Never overwritten once set.
    pub original_amount_cents: Option<i64>,
    pub created_by: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InvoicePayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.status == LedgerStatus::Confirmed
    }

    /// Applies a correction in memory.
    ///
    /// Only supplied fields change. When a reason is given, the corrector and
    /// timestamp are stamped and the amount prior to this edit is kept in
    /// `original_amount_cents`, unless an earlier correction already recorded
    /// one: the very first amount stays authoritative.
    pub fn apply_correction(
        &mut self,
        req: &CorrectPaymentRequest,
        corrected_by: Option<i64>,
        now: DateTime<Utc>,
    ) -> ValidationResult<CorrectionOutcome> {
        req.validate()?;

        let prior_amount = self.amount_cents;
        let prior_status = self.status;

        if let Some(amount) = req.amount_cents {
            self.amount_cents = amount;
        }
        if let Some(method) = &req.payment_method {
            self.payment_method = method.clone();
        }
        if let Some(date) = req.payment_date {
            self.payment_date = date;
        }
        if let Some(reference) = &req.transaction_reference {
            self.transaction_reference = Some(reference.clone());
        }
        if let Some(notes) = &req.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(status) = req.status {
            self.status = status;
        }

        if let Some(reason) = &req.correction_reason {
            self.correction_reason = Some(reason.clone());
            self.corrected_by = corrected_by;
            self.corrected_at = Some(now);
            if self.original_amount_cents.is_none() {
                self.original_amount_cents = Some(prior_amount);
            }
        }

        self.updated_at = now;

        Ok(CorrectionOutcome {
            amount_changed: self.amount_cents != prior_amount,
            status_changed: self.status != prior_status,
        })
    }
}

/// What a correction touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionOutcome {
    pub amount_changed: bool,
    pub status_changed: bool,
}

impl CorrectionOutcome {
    /// Whether the invoice's paid amount must be recomputed.
    pub fn affects_balance(&self) -> bool {
        self.amount_changed || self.status_changed
    }
}

/// Sum of confirmed payment amounts.
pub fn confirmed_total(payments: &[InvoicePayment]) -> Money {
    payments
        .iter()
        .filter(|p| p.is_confirmed())
        .map(InvoicePayment::amount)
        .sum()
}

// =============================================================================
// Requests
// =============================================================================

/// Payload for registering a payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterPaymentRequest {
    pub amount_cents: i64,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transaction_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RegisterPaymentRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_payment_amount(self.amount_cents)?;
        validate_optional_text("payment_method", self.payment_method.as_deref(), 50)?;
        validate_optional_text("transaction_reference", self.transaction_reference.as_deref(), 100)?;
        validate_optional_text("notes", self.notes.as_deref(), 1000)
    }
}

/// Payload for correcting a payment. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CorrectPaymentRequest {
    pub amount_cents: Option<i64>,
    pub payment_method: Option<String>,
    #[ts(as = "Option<String>")]
    pub payment_date: Option<DateTime<Utc>>,
    pub transaction_reference: Option<String>,
    pub notes: Option<String>,
    pub status: Option<LedgerStatus>,
    pub correction_reason: Option<String>,
}

impl CorrectPaymentRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(amount) = self.amount_cents {
            validate_payment_amount(amount)?;
        }
        validate_optional_text("payment_method", self.payment_method.as_deref(), 50)?;
        validate_optional_text("transaction_reference", self.transaction_reference.as_deref(), 100)?;
        validate_optional_text("notes", self.notes.as_deref(), 1000)?;
        validate_optional_text("correction_reason", self.correction_reason.as_deref(), 500)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payment(amount: i64) -> InvoicePayment {
        let now = Utc::now();
        InvoicePayment {
            id: 1,
            invoice_id: 1,
            amount_cents: amount,
            payment_method: "cash".to_string(),
            payment_date: now,
            transaction_reference: None,
            notes: None,
            status: LedgerStatus::Confirmed,
            correction_reason: None,
            corrected_by: None,
            corrected_at: None,
            original_amount_cents: None,
            created_by: Some(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_correction_preserves_original_amount() {
        let mut p = payment(10_000);
        let now = Utc::now();
        let outcome = p
            .apply_correction(
                &CorrectPaymentRequest {
                    amount_cents: Some(15_000),
                    correction_reason: Some("typo".into()),
                    ..Default::default()
                },
                Some(9),
                now,
            )
            .unwrap();

        assert!(outcome.amount_changed);
        assert!(outcome.affects_balance());
        assert_eq!(p.amount_cents, 15_000);
        assert_eq!(p.original_amount_cents, Some(10_000));
        assert_eq!(p.corrected_by, Some(9));
        assert_eq!(p.corrected_at, Some(now));
    }

    #[test]
    fn test_second_correction_keeps_first_original() {
        let mut p = payment(10_000);
        let now = Utc::now();
        for (amount, offset) in [(15_000, 0), (12_000, 1)] {
            p.apply_correction(
                &CorrectPaymentRequest {
                    amount_cents: Some(amount),
                    correction_reason: Some("adjust".into()),
                    ..Default::default()
                },
                Some(9),
                now + Duration::minutes(offset),
            )
            .unwrap();
        }

        assert_eq!(p.amount_cents, 12_000);
        assert_eq!(p.original_amount_cents, Some(10_000));
    }

    #[test]
    fn test_edit_without_reason_does_not_stamp() {
        let mut p = payment(10_000);
        let outcome = p
            .apply_correction(
                &CorrectPaymentRequest {
                    notes: Some("bank transfer".into()),
                    ..Default::default()
                },
                Some(9),
                Utc::now(),
            )
            .unwrap();

        assert!(!outcome.affects_balance());
        assert!(p.corrected_at.is_none());
        assert!(p.original_amount_cents.is_none());
        assert_eq!(p.notes.as_deref(), Some("bank transfer"));
    }

    #[test]
    fn test_voiding_affects_balance() {
        let mut p = payment(10_000);
        let outcome = p
            .apply_correction(
                &CorrectPaymentRequest {
                    status: Some(LedgerStatus::Voided),
                    ..Default::default()
                },
                None,
                Utc::now(),
            )
            .unwrap();
        assert!(outcome.status_changed);
        assert!(!outcome.amount_changed);
    }

    #[test]
    fn test_non_positive_correction_rejected() {
        let mut p = payment(10_000);
        let result = p.apply_correction(
            &CorrectPaymentRequest {
                amount_cents: Some(0),
                ..Default::default()
            },
            None,
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(p.amount_cents, 10_000);
    }

    #[test]
    fn test_confirmed_total_skips_voided() {
        let mut voided = payment(5_000);
        voided.status = LedgerStatus::Voided;
        let ledger = vec![payment(10_000), payment(20_000), voided];
        assert_eq!(confirmed_total(&ledger).cents(), 30_000);
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterPaymentRequest {
            amount_cents: 0,
            payment_method: None,
            payment_date: None,
            transaction_reference: None,
            notes: None,
        };
        assert!(req.validate().is_err());
    }
}
