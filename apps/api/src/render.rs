//! # Document Rendering
//!
//! The print endpoint hands a hydrated invoice to a [`DocumentRenderer`] and
//! streams back whatever bytes it produces. The shipped renderer writes a
//! plain-text receipt sized for an 80 mm thermal printer (48 columns).
//!
//! ## Receipt Layout
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                  STEEL POS                     │
//! │ Invoice: INV-000042          2026-03-01 09:15  │
//! │ Customer: Anh Minh (0912345678)                │
//! │------------------------------------------------│
//! │ Thép hộp mạ kẽm - 40x80 dày 1.4                │
//! │   2 cây x 325000.00               650000.00    │
//! │------------------------------------------------│
//! │ Subtotal / Discount / Tax / TOTAL              │
//! │ Paid / Outstanding / payments                  │
//! └────────────────────────────────────────────────┘
//! ```

use std::fmt::Write;

use steel_core::invoice::{Invoice, InvoiceStatus};
use steel_core::payment::LedgerStatus;
use steel_core::Money;

const WIDTH: usize = 48;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to render document: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Turns an invoice into a printable document.
pub trait DocumentRenderer: Send + Sync {
    /// `Content-Type` of the produced bytes.
    fn content_type(&self) -> &'static str;

    fn render_invoice(&self, invoice: &Invoice) -> Result<Vec<u8>, RenderError>;
}

/// Plain-text receipt renderer.
#[derive(Debug, Clone)]
pub struct TextReceiptRenderer {
    store_name: String,
}

impl TextReceiptRenderer {
    pub fn new(store_name: impl Into<String>) -> Self {
        TextReceiptRenderer {
            store_name: store_name.into(),
        }
    }
}

fn centered(out: &mut String, text: &str) -> std::fmt::Result {
    let len = text.chars().count();
    let pad = WIDTH.saturating_sub(len) / 2;
    writeln!(out, "{}{}", " ".repeat(pad), text)
}

fn amount_row(out: &mut String, label: &str, amount: Money) -> std::fmt::Result {
    let value = amount.to_string();
    let gap = WIDTH.saturating_sub(label.chars().count() + value.len()).max(1);
    writeln!(out, "{}{}{}", label, " ".repeat(gap), value)
}

fn quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{}", qty as i64)
    } else {
        format!("{}", qty)
    }
}

impl DocumentRenderer for TextReceiptRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render_invoice(&self, invoice: &Invoice) -> Result<Vec<u8>, RenderError> {
        let rule = "-".repeat(WIDTH);
        let mut out = String::new();

        centered(&mut out, &self.store_name.to_uppercase())?;
        if invoice.status == InvoiceStatus::Cancelled {
            centered(&mut out, "*** CANCELLED ***")?;
        }
        writeln!(
            out,
            "Invoice: {}  {}",
            invoice.invoice_code,
            invoice.created_at.format("%Y-%m-%d %H:%M")
        )?;
        writeln!(out, "Customer: {} ({})", invoice.customer_name, invoice.customer_phone)?;
        if let Some(address) = &invoice.customer_address {
            writeln!(out, "Address: {}", address)?;
        }
        writeln!(out, "{}", rule)?;

        for item in &invoice.items {
            match &item.variant_name {
                Some(variant) => writeln!(out, "{} - {}", item.product_name, variant)?,
                None => writeln!(out, "{}", item.product_name)?,
            }
            let qty = match &item.unit {
                Some(unit) => format!("  {} {} x {}", quantity(item.quantity), unit, item.unit_price()),
                None => format!("  {} x {}", quantity(item.quantity), item.unit_price()),
            };
            amount_row(&mut out, &qty, item.total_price())?;
            if let Some(notes) = &item.product_notes {
                writeln!(out, "  ({})", notes)?;
            }
        }

        writeln!(out, "{}", rule)?;
        amount_row(&mut out, "Subtotal", invoice.subtotal())?;
        if invoice.discount_cents > 0 {
            amount_row(&mut out, "Discount", invoice.discount())?;
        }
        if invoice.tax_cents > 0 {
            amount_row(&mut out, "Tax", invoice.tax())?;
        }
        amount_row(&mut out, "TOTAL", invoice.total())?;
        amount_row(&mut out, "Paid", invoice.paid())?;
        amount_row(&mut out, "Outstanding", invoice.outstanding())?;

        let payments: Vec<_> = invoice
            .payments
            .iter()
            .filter(|p| p.status == LedgerStatus::Confirmed)
            .collect();
        if !payments.is_empty() {
            writeln!(out, "{}", rule)?;
            for payment in payments {
                let label = format!(
                    "{} {}",
                    payment.payment_date.format("%Y-%m-%d"),
                    payment.payment_method
                );
                amount_row(&mut out, &label, payment.amount())?;
            }
        }

        if let Some(notes) = &invoice.notes {
            writeln!(out, "{}", rule)?;
            writeln!(out, "{}", notes)?;
        }
        writeln!(out, "{}", rule)?;
        centered(&mut out, "Thank you!")?;

        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use steel_core::invoice::{InvoiceItem, PaymentStatus};
    use steel_core::payment::InvoicePayment;

    fn invoice() -> Invoice {
        let now = Utc::now();
        Invoice {
            id: 1,
            invoice_code: "INV-000042".into(),
            customer_id: Some(3),
            customer_name: "Anh Minh".into(),
            customer_phone: "0912345678".into(),
            customer_address: None,
            subtotal_cents: 65_000_000,
            discount_cents: 0,
            discount_bps: None,
            tax_cents: 0,
            tax_bps: None,
            total_cents: 65_000_000,
            paid_cents: 20_000_000,
            payment_status: PaymentStatus::Partial,
            status: InvoiceStatus::Confirmed,
            payment_method: Some("cash".into()),
            notes: None,
            created_by: Some(2),
            created_by_name: Some("quan.ly".into()),
            created_at: now,
            updated_at: now,
            items: vec![InvoiceItem {
                id: 1,
                invoice_id: 1,
                product_id: Some(1),
                variant_id: Some(1),
                product_name: "Thép hộp mạ kẽm".into(),
                variant_name: Some("40x80 dày 1.4".into()),
                unit: Some("cây".into()),
                quantity: 2.0,
                unit_price_cents: 32_500_000,
                total_price_cents: 65_000_000,
                product_notes: None,
                created_at: now,
                updated_at: now,
            }],
            payments: vec![InvoicePayment {
                id: 1,
                invoice_id: 1,
                amount_cents: 20_000_000,
                payment_method: "cash".into(),
                payment_date: now,
                transaction_reference: None,
                notes: None,
                status: LedgerStatus::Confirmed,
                correction_reason: None,
                corrected_by: None,
                corrected_at: None,
                original_amount_cents: None,
                created_by: Some(2),
                created_at: now,
                updated_at: now,
            }],
        }
    }

    #[test]
    fn test_text_receipt() {
        let renderer = TextReceiptRenderer::new("Steel POS");
        let bytes = renderer.render_invoice(&invoice()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("STEEL POS"));
        assert!(text.contains("Invoice: INV-000042"));
        assert!(text.contains("Thép hộp mạ kẽm - 40x80 dày 1.4"));
        assert!(text.contains("2 cây x 325000.00"));
        assert!(text.contains("650000.00"));
        assert!(text.contains("Outstanding"));
        assert!(text.contains("450000.00"));
        assert!(!text.contains("CANCELLED"));
    }

    #[test]
    fn test_cancelled_banner() {
        let mut cancelled = invoice();
        cancelled.status = InvoiceStatus::Cancelled;
        let text = String::from_utf8(TextReceiptRenderer::new("Steel POS").render_invoice(&cancelled).unwrap()).unwrap();
        assert!(text.contains("*** CANCELLED ***"));
    }
}
