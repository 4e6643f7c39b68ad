//! # Invoice Aggregate
//!
//! Totals, payment-status derivation and partial updates for customer invoices.
//!
//! ## Invoice Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Invoice Totals                                 │
//! │                                                                         │
//! │  line.total    = round(quantity × unit_price)                           │
//! │  subtotal      = Σ line.total                                           │
//! │  discount      = amount  │ subtotal × pct        │ 0                    │
//! │  tax           = amount  │ (subtotal-discount)×pct│ 0                   │
//! │  total         = subtotal - discount + tax                              │
//! │                                                                         │
//! │  payment_status:                                                        │
//! │      paid == 0           → pending                                      │
//! │      paid >= total       → paid                                         │
//! │      otherwise           → partial                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Product and variant names are copied into each line at write time.
//! Historical invoices never join to the live catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use ts_rs::TS;

use crate::customer::CustomerSnapshot;
use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, Rate};
use crate::payment::{InvoicePayment, RegisterPaymentRequest};
use crate::validation::{
    bounded_amount, checked_total, validate_item_count, validate_non_negative_cents, validate_optional_text,
    validate_percentage, validate_phone, validate_quantity, validate_required_text,
    ValidationResult,
};
use crate::DEFAULT_PAYMENT_METHOD;

// =============================================================================
// Status Enums
// =============================================================================

/// How much of the invoice has been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet.
    Pending,
    /// Something paid, balance outstanding.
    Partial,
    /// Paid in full (or overpaid).
    Paid,
}

impl PaymentStatus {
    /// Derives the status from the paid amount and the invoice total.
    ///
    /// A zero-value invoice with nothing paid stays `pending`.
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::invoice::PaymentStatus;
    /// use steel_core::Money;
    ///
    /// let total = Money::from_cents(30_000);
    /// assert_eq!(PaymentStatus::derive(Money::zero(), total), PaymentStatus::Pending);
    /// assert_eq!(PaymentStatus::derive(Money::from_cents(10_000), total), PaymentStatus::Partial);
    /// assert_eq!(PaymentStatus::derive(total, total), PaymentStatus::Paid);
    /// ```
    pub fn derive(paid: Money, total: Money) -> Self {
        if !paid.is_positive() {
            PaymentStatus::Pending
        } else if paid >= total {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Lifecycle of an invoice. Deleting an invoice moves it to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Confirmed,
    Cancelled,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Confirmed => "confirmed",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Confirmed
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A customer invoice with its lines and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Invoice {
    pub id: i64,
    /// Human-readable code, e.g. `INV-000042`.
    pub invoice_code: String,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// Set when the discount was given as a percentage.
    pub discount_bps: Option<i64>,
    pub tax_cents: i64,
    /// Set when the tax was given as a percentage.
    pub tax_bps: Option<i64>,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub payment_status: PaymentStatus,
    pub status: InvoiceStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub payments: Vec<InvoicePayment>,
}

impl Invoice {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn paid(&self) -> Money {
        Money::from_cents(self.paid_cents)
    }

    /// Remaining balance, never below zero.
    pub fn outstanding(&self) -> Money {
        let balance = self.total() - self.paid();
        if balance.is_negative() {
            Money::zero()
        } else {
            balance
        }
    }

    pub fn discount_rate(&self) -> Option<Rate> {
        self.discount_bps.map(Rate::from_bps)
    }

    pub fn tax_rate(&self) -> Option<Rate> {
        self.tax_bps.map(Rate::from_bps)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == InvoiceStatus::Cancelled
    }

    /// Sets the paid amount and rederives the payment status.
    pub fn set_paid(&mut self, paid: Money) {
        self.paid_cents = paid.cents();
        self.payment_status = PaymentStatus::derive(paid, self.total());
    }

    /// Applies a partial update in memory.
    ///
    /// Returns the replacement line set when the request carries items,
    /// so the caller can rewrite the stored lines in the same transaction.
    ///
    /// ## Rules
    /// - Absent fields keep their stored values
    /// - Items replace the whole set; lines flagged `is_deleted` are dropped
    /// - Totals are recomputed when items, discount or tax are supplied
    /// - Without a new discount/tax, a stored percentage is re-applied to the
    ///   new subtotal; a stored absolute amount is kept as is
    /// - `paid_cents` overrides the paid amount directly (not a ledger entry)
    pub fn apply_update(&mut self, req: &UpdateInvoiceRequest) -> CoreResult<Option<Vec<InvoiceLine>>> {
        req.validate()?;

        if let Some(name) = &req.customer_name {
            self.customer_name = name.trim().to_string();
        }
        if let Some(phone) = &req.customer_phone {
            self.customer_phone = phone.trim().to_string();
        }
        if let Some(address) = &req.customer_address {
            self.customer_address = Some(address.clone());
        }
        if let Some(method) = &req.payment_method {
            self.payment_method = Some(method.clone());
        }
        if let Some(notes) = &req.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(status) = req.status {
            self.status = status;
        }

        let replacement = req.items.as_ref().map(|lines| {
            lines
                .iter()
                .filter(|l| !l.is_deleted)
                .map(|l| l.line.clone())
                .collect::<Vec<_>>()
        });

        if let Some(lines) = &replacement {
            validate_lines(lines)?;
        }

        let discount = Adjustment::from_request(
            "discount",
            req.discount_cents,
            req.discount_percentage,
        )?;
        let tax = Adjustment::from_request("tax", req.tax_cents, req.tax_percentage)?;

        if replacement.is_some() || discount.is_some() || tax.is_some() {
            let subtotal = match &replacement {
                Some(lines) => checked_total("subtotal_cents", lines.iter().map(InvoiceLine::line_total))?,
                None => self.subtotal(),
            };
            let discount = discount.unwrap_or_else(|| {
                Adjustment::stored(self.discount(), self.discount_rate())
            });
            let tax = tax.unwrap_or_else(|| Adjustment::stored(self.tax(), self.tax_rate()));

            let totals = InvoiceTotals::compute(subtotal, discount, tax)?;
            self.apply_totals(&totals);
        }

        let paid = match req.paid_cents {
            Some(cents) => Money::from_cents(cents),
            None => self.paid(),
        };
        self.set_paid(paid);

        Ok(replacement)
    }

    fn apply_totals(&mut self, totals: &InvoiceTotals) {
        self.subtotal_cents = totals.subtotal.cents();
        self.discount_cents = totals.discount.cents();
        self.discount_bps = totals.discount_rate.map(|r| r.bps());
        self.tax_cents = totals.tax.cents();
        self.tax_bps = totals.tax_rate.map(|r| r.bps());
        self.total_cents = totals.total.cents();
    }

    /// Structured snapshot for the audit trail.
    ///
    /// Money is expressed in major units so diff summaries read naturally.
    pub fn snapshot(&self) -> Value {
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|item| {
                json!({
                    "product_id": item.product_id,
                    "variant_id": item.variant_id,
                    "product_name": item.product_name,
                    "variant_name": item.variant_name,
                    "unit": item.unit,
                    "quantity": item.quantity,
                    "unit_price": item.unit_price().to_major(),
                    "total_price": item.total_price().to_major(),
                })
            })
            .collect();

        json!({
            "id": self.id,
            "invoice_code": self.invoice_code,
            "customer_id": self.customer_id,
            "customer_name": self.customer_name,
            "customer_phone": self.customer_phone,
            "customer_address": self.customer_address,
            "notes": self.notes,
            "payment_method": self.payment_method,
            "status": self.status.as_str(),
            "payment_status": self.payment_status.as_str(),
            "subtotal_amount": self.subtotal().to_major(),
            "discount_amount": self.discount().to_major(),
            "tax_amount": self.tax().to_major(),
            "paid_amount": self.paid().to_major(),
            "total_amount": self.total().to_major(),
            "items": items,
        })
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A stored invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    /// Catalog product, absent for free-text lines.
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    /// Name at time of sale (frozen).
    pub product_name: String,
    /// Variant name at time of sale (frozen).
    pub variant_name: Option<String>,
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price_cents: i64,
    /// `round(quantity × unit_price)`.
    pub total_price_cents: i64,
    pub product_notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InvoiceItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// A requested invoice line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLine {
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub variant_id: Option<i64>,
    /// May be left empty for catalog-bound lines; the catalog name is copied in.
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub variant_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price_cents: i64,
    #[serde(default)]
    pub product_notes: Option<String>,
}

impl InvoiceLine {
    /// `round(quantity × unit_price)`.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents).multiply_quantity(self.quantity)
    }

    /// Validates a line; `index` is used in field names.
    pub fn validate(&self, index: usize) -> ValidationResult<()> {
        validate_quantity(&format!("items[{}].quantity", index), self.quantity)?;
        validate_non_negative_cents(
            &format!("items[{}].unit_price_cents", index),
            self.unit_price_cents,
        )?;
        bounded_amount(
            &format!("items[{}].total_price_cents", index),
            Money::from_cents(self.unit_price_cents).checked_multiply_quantity(self.quantity),
        )?;

        if self.variant_id.is_none() {
            validate_required_text(&format!("items[{}].product_name", index), &self.product_name, 200)?;
        } else {
            validate_optional_text(
                &format!("items[{}].product_name", index),
                Some(&self.product_name),
                200,
            )?;
        }

        validate_optional_text(
            &format!("items[{}].product_notes", index),
            self.product_notes.as_deref(),
            500,
        )
    }

    /// Whether the catalog snapshot still has to be copied in.
    pub fn needs_catalog_snapshot(&self) -> bool {
        self.variant_id.is_some() && self.product_name.trim().is_empty()
    }
}

/// A line in an update request. Lines flagged `is_deleted` are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateInvoiceLine {
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(flatten)]
    pub line: InvoiceLine,
}

fn validate_lines(lines: &[InvoiceLine]) -> ValidationResult<()> {
    validate_item_count(lines.len())?;
    lines
        .iter()
        .enumerate()
        .try_for_each(|(index, line)| line.validate(index))
}

// =============================================================================
// Discount / Tax Resolution
// =============================================================================

/// How a discount or tax is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    None,
    Amount(Money),
    Percentage(Rate),
}

impl Adjustment {
    /// Reads an adjustment from request fields. An absolute amount wins over a
    /// percentage. Returns `None` when neither field is present.
    pub fn from_request(
        field: &str,
        amount_cents: Option<i64>,
        percentage: Option<f64>,
    ) -> ValidationResult<Option<Self>> {
        if let Some(cents) = amount_cents {
            validate_non_negative_cents(&format!("{}_cents", field), cents)?;
            return Ok(Some(Adjustment::Amount(Money::from_cents(cents))));
        }

        if let Some(pct) = percentage {
            validate_percentage(&format!("{}_percentage", field), pct)?;
            return Ok(Some(Adjustment::Percentage(Rate::from_percentage(pct))));
        }

        Ok(None)
    }

    /// Rebuilds the adjustment an invoice was saved with.
    pub fn stored(amount: Money, rate: Option<Rate>) -> Self {
        match rate {
            Some(rate) => Adjustment::Percentage(rate),
            None if amount.is_zero() => Adjustment::None,
            None => Adjustment::Amount(amount),
        }
    }

    fn resolve(&self, base: Money) -> (Money, Option<Rate>) {
        match *self {
            Adjustment::None => (Money::zero(), None),
            Adjustment::Amount(amount) => (amount, None),
            Adjustment::Percentage(rate) => (base.percentage(rate), Some(rate)),
        }
    }
}

/// Resolved invoice totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub discount_rate: Option<Rate>,
    pub tax: Money,
    pub tax_rate: Option<Rate>,
    pub total: Money,
}

impl InvoiceTotals {
    /// Computes discount, tax and total from a subtotal.
    ///
    /// Tax applies to `subtotal - discount`.
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::invoice::{Adjustment, InvoiceTotals};
    /// use steel_core::{Money, Rate};
    ///
    /// let totals = InvoiceTotals::compute(
    ///     Money::from_cents(100_000),
    ///     Adjustment::Percentage(Rate::from_percentage(10.0)),
    ///     Adjustment::Percentage(Rate::from_percentage(8.0)),
    /// )
    /// .unwrap();
    /// assert_eq!(totals.discount.cents(), 10_000);
    /// assert_eq!(totals.tax.cents(), 7_200);
    /// assert_eq!(totals.total.cents(), 97_200);
    /// ```
    pub fn compute(subtotal: Money, discount: Adjustment, tax: Adjustment) -> ValidationResult<Self> {
        let (discount_amount, discount_rate) = discount.resolve(subtotal);
        if discount_amount > subtotal {
            return Err(ValidationError::DiscountExceedsSubtotal {
                discount_cents: discount_amount.cents(),
                subtotal_cents: subtotal.cents(),
            });
        }

        let taxable = subtotal - discount_amount;
        let (tax_amount, tax_rate) = tax.resolve(taxable);
        let total = bounded_amount("total_cents", taxable.checked_add(tax_amount))?;

        Ok(InvoiceTotals {
            subtotal,
            discount: discount_amount,
            discount_rate,
            tax: tax_amount,
            tax_rate,
            total,
        })
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Payload for creating an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CreateInvoiceRequest {
    /// Existing customer; when absent, phone and name are required and the
    /// customer is found or created by phone.
    pub customer_id: Option<i64>,
    pub customer_phone: Option<String>,
    pub customer_name: Option<String>,
    pub customer_address: Option<String>,
    pub items: Vec<InvoiceLine>,
    pub discount_cents: Option<i64>,
    pub discount_percentage: Option<f64>,
    pub tax_cents: Option<i64>,
    pub tax_percentage: Option<f64>,
    /// Upfront payment recorded as the first ledger entry.
    pub paid_cents: Option<i64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl CreateInvoiceRequest {
    /// Validates everything that does not need the database.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_lines(&self.items)?;

        if self.customer_id.is_none() {
            validate_phone(self.customer_phone.as_deref().unwrap_or_default())?;
            validate_required_text(
                "customer_name",
                self.customer_name.as_deref().unwrap_or_default(),
                200,
            )?;
        } else if let Some(phone) = &self.customer_phone {
            validate_phone(phone)?;
        }

        validate_optional_text("customer_address", self.customer_address.as_deref(), 500)?;
        validate_optional_text("payment_method", self.payment_method.as_deref(), 50)?;
        validate_optional_text("notes", self.notes.as_deref(), 2000)?;

        if let Some(paid) = self.paid_cents {
            validate_non_negative_cents("paid_cents", paid)?;
        }

        Adjustment::from_request("discount", self.discount_cents, self.discount_percentage)?;
        Adjustment::from_request("tax", self.tax_cents, self.tax_percentage)?;

        Ok(())
    }
}

/// Payload for a partial invoice update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct UpdateInvoiceRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub items: Option<Vec<UpdateInvoiceLine>>,
    pub discount_cents: Option<i64>,
    pub discount_percentage: Option<f64>,
    pub tax_cents: Option<i64>,
    pub tax_percentage: Option<f64>,
    /// Direct correction of the paid amount, bypassing the payment ledger.
    pub paid_cents: Option<i64>,
    pub payment_method: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub notes: Option<String>,
}

impl UpdateInvoiceRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.customer_name {
            validate_required_text("customer_name", name, 200)?;
        }
        if let Some(phone) = &self.customer_phone {
            validate_phone(phone)?;
        }
        validate_optional_text("customer_address", self.customer_address.as_deref(), 500)?;
        validate_optional_text("payment_method", self.payment_method.as_deref(), 50)?;
        validate_optional_text("notes", self.notes.as_deref(), 2000)?;
        if let Some(paid) = self.paid_cents {
            validate_non_negative_cents("paid_cents", paid)?;
        }
        Ok(())
    }
}

// =============================================================================
// Draft
// =============================================================================

/// A fully computed invoice ready to be written.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub customer: CustomerSnapshot,
    pub lines: Vec<InvoiceLine>,
    pub totals: InvoiceTotals,
    pub paid: Money,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// First ledger entry when an upfront amount was supplied.
    pub upfront_payment: Option<RegisterPaymentRequest>,
}

impl InvoiceDraft {
    /// Computes totals and payment state for a validated request.
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::customer::CustomerSnapshot;
    /// use steel_core::invoice::{CreateInvoiceRequest, InvoiceDraft, InvoiceLine, PaymentStatus};
    ///
    /// let line = |qty: f64, price: i64| InvoiceLine {
    ///     product_id: None,
    ///     variant_id: None,
    ///     product_name: "Thép tấm".into(),
    ///     variant_name: None,
    ///     unit: None,
    ///     quantity: qty,
    ///     unit_price_cents: price,
    ///     product_notes: None,
    /// };
    /// let req = CreateInvoiceRequest {
    ///     items: vec![line(2.0, 10_000), line(1.0, 5_000)],
    ///     ..Default::default()
    /// };
    /// let draft = InvoiceDraft::build(&req, CustomerSnapshot::walk_in("0900000000", "A")).unwrap();
    /// assert_eq!(draft.totals.subtotal.cents(), 25_000);
    /// assert_eq!(draft.totals.total.cents(), 25_000);
    /// assert_eq!(draft.payment_status, PaymentStatus::Pending);
    /// ```
    pub fn build(req: &CreateInvoiceRequest, customer: CustomerSnapshot) -> CoreResult<Self> {
        validate_lines(&req.items)?;

        let subtotal = checked_total("subtotal_cents", req.items.iter().map(InvoiceLine::line_total))?;
        let discount = Adjustment::from_request("discount", req.discount_cents, req.discount_percentage)?
            .unwrap_or(Adjustment::None);
        let tax = Adjustment::from_request("tax", req.tax_cents, req.tax_percentage)?
            .unwrap_or(Adjustment::None);
        let totals = InvoiceTotals::compute(subtotal, discount, tax)?;

        let paid = Money::from_cents(req.paid_cents.unwrap_or(0));
        validate_non_negative_cents("paid_cents", paid.cents())?;

        let upfront_payment = paid.is_positive().then(|| RegisterPaymentRequest {
            amount_cents: paid.cents(),
            payment_method: Some(
                req.payment_method
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            ),
            payment_date: None,
            transaction_reference: None,
            notes: Some("Payment at invoice creation".to_string()),
        });

        Ok(InvoiceDraft {
            customer,
            lines: req.items.clone(),
            payment_status: PaymentStatus::derive(paid, totals.total),
            totals,
            paid,
            payment_method: req.payment_method.clone(),
            notes: req.notes.clone(),
            upfront_payment,
        })
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Filters for listing invoices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct InvoiceFilter {
    /// Matches invoice code, customer name or phone.
    pub search: Option<String>,
    pub status: Option<InvoiceStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Aggregates over non-cancelled invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InvoiceSummary {
    pub invoice_count: i64,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
    pub today_count: i64,
    pub today_total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
