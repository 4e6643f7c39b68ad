//! # Payment Repository
//!
//! The payment ledger. Every mutation runs in one transaction that first
//! write-touches the parent invoice, so concurrent ledger writes on the same
//! invoice serialize and `paid_cents` can never lose an update.
//!
//! ## Balance Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register  : paid = paid + amount                 (append only)        │
//! │  correct   : paid = Σ confirmed   when amount or status changed        │
//! │  delete    : paid = Σ confirmed                                        │
//! │                                                                         │
//! │  payment_status is rederived from (paid, total) after each write       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use steel_core::audit::{entity, NewAuditEntry};
use steel_core::invoice::Invoice;
use steel_core::payment::{CorrectPaymentRequest, InvoicePayment, LedgerStatus, RegisterPaymentRequest};
use steel_core::validation::bounded_amount;
use steel_core::{Actor, Money, DEFAULT_PAYMENT_METHOD};
use tracing::{debug, info, warn};

use super::{audit, invoice};
use crate::error::{DbError, DbResult};

const PAYMENT_COLUMNS: &str = "id, invoice_id, amount_cents, payment_method, payment_date, \
    transaction_reference, notes, status, correction_reason, corrected_by, corrected_at, \
    original_amount_cents, created_by, created_at, updated_at";

const CANCELLED_INVOICE: &str = "Cannot register a payment on a cancelled invoice";

/// Payments of one invoice in payment order.
pub(crate) async fn list_for_invoice(conn: &mut SqliteConnection, invoice_id: i64) -> DbResult<Vec<InvoicePayment>> {
    let payments = sqlx::query_as::<_, InvoicePayment>(&format!(
        "SELECT {} FROM invoice_payments WHERE invoice_id = ?1 ORDER BY payment_date, id",
        PAYMENT_COLUMNS
    ))
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

/// Appends a confirmed payment row. The caller owns the balance update.
pub(crate) async fn insert(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    req: &RegisterPaymentRequest,
    created_by: Option<i64>,
) -> DbResult<InvoicePayment> {
    let now = Utc::now();
    let method = req
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PAYMENT_METHOD);

    let id = sqlx::query(
        r#"
        INSERT INTO invoice_payments (
            invoice_id, amount_cents, payment_method, payment_date,
            transaction_reference, notes, status, created_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        "#,
    )
    .bind(invoice_id)
    .bind(req.amount_cents)
    .bind(method)
    .bind(req.payment_date.unwrap_or(now))
    .bind(req.transaction_reference.as_deref())
    .bind(req.notes.as_deref())
    .bind(LedgerStatus::Confirmed)
    .bind(created_by)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    debug!(payment_id = id, invoice_id, amount_cents = req.amount_cents, "Inserted payment");

    find(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("InvoicePayment", id))
}

async fn find(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<InvoicePayment>> {
    let payment = sqlx::query_as::<_, InvoicePayment>(&format!(
        "SELECT {} FROM invoice_payments WHERE id = ?1",
        PAYMENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(payment)
}

/// Write-touches the invoice owning `payment_id`. NotFound when the
/// payment does not exist.
async fn lock_parent(conn: &mut SqliteConnection, payment_id: i64) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE invoices SET updated_at = ?1 \
         WHERE id = (SELECT invoice_id FROM invoice_payments WHERE id = ?2)",
    )
    .bind(Utc::now())
    .bind(payment_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("InvoicePayment", payment_id));
    }
    Ok(())
}

/// Sets the invoice balance to the sum of its confirmed payments.
async fn recompute_balance(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    let paid: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM invoice_payments WHERE invoice_id = ?1 AND status = ?2",
    )
    .bind(invoice.id)
    .bind(LedgerStatus::Confirmed)
    .fetch_one(&mut *conn)
    .await?;

    let mut balance = invoice.clone();
    balance.set_paid(bounded_amount("paid_cents", Some(Money::from_cents(paid)))?);
    invoice::store_paid(conn, &balance).await
}

/// Repository for the payment ledger.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by its own id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<InvoicePayment>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut conn, id).await
    }

    /// All payments of an invoice.
    pub async fn list_by_invoice(&self, invoice_id: i64) -> DbResult<Vec<InvoicePayment>> {
        let mut conn = self.pool.acquire().await?;
        list_for_invoice(&mut conn, invoice_id).await
    }

    /// Registers a payment and adds it to the invoice balance.
    ///
    /// ## Errors
    /// - `Rule(Validation)` when the amount is not positive, or the paid
    ///   balance would leave the allowed amount range
    /// - `NotFound` for an unknown invoice
    /// - `Rule(Conflict)` when the invoice is cancelled
    pub async fn register(
        &self,
        invoice_id: i64,
        req: RegisterPaymentRequest,
        actor: &Actor,
    ) -> DbResult<InvoicePayment> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;

        invoice::lock(&mut tx, invoice_id).await?;
        let before = invoice::fetch_required(&mut tx, invoice_id).await?;
        if before.is_cancelled() {
            warn!(invoice_id, "Payment rejected on cancelled invoice");
            return Err(DbError::conflict(CANCELLED_INVOICE));
        }

        let payment = insert(&mut tx, invoice_id, &req, actor.user_id).await?;

        let mut balance = before.clone();
        balance.set_paid(bounded_amount("paid_cents", before.paid().checked_add(payment.amount()))?);
        invoice::store_paid(&mut tx, &balance).await?;

        let after = invoice::fetch_required(&mut tx, invoice_id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::updated(entity::INVOICE, invoice_id, actor, before.snapshot(), after.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            payment_id = payment.id,
            invoice_id,
            amount_cents = payment.amount_cents,
            paid_cents = after.paid_cents,
            payment_status = after.payment_status.as_str(),
            "Payment registered"
        );
        Ok(payment)
    }

    /// Corrects a payment. Only supplied fields change; with a reason the
    /// corrector, timestamp and first pre-correction amount are recorded.
    /// The invoice balance is recomputed when the amount or status changed.
    pub async fn correct(
        &self,
        payment_id: i64,
        req: CorrectPaymentRequest,
        actor: &Actor,
    ) -> DbResult<InvoicePayment> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;

        lock_parent(&mut tx, payment_id).await?;
        let mut payment = find(&mut tx, payment_id)
            .await?
            .ok_or_else(|| DbError::not_found("InvoicePayment", payment_id))?;
        let before = invoice::fetch_required(&mut tx, payment.invoice_id).await?;

        let outcome = payment.apply_correction(&req, actor.user_id, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE invoice_payments SET
                amount_cents = ?1,
                payment_method = ?2,
                payment_date = ?3,
                transaction_reference = ?4,
                notes = ?5,
                status = ?6,
                correction_reason = ?7,
                corrected_by = ?8,
                corrected_at = ?9,
                original_amount_cents = ?10,
                updated_at = ?11
            WHERE id = ?12
            "#,
        )
        .bind(payment.amount_cents)
        .bind(&payment.payment_method)
        .bind(payment.payment_date)
        .bind(payment.transaction_reference.as_deref())
        .bind(payment.notes.as_deref())
        .bind(payment.status)
        .bind(payment.correction_reason.as_deref())
        .bind(payment.corrected_by)
        .bind(payment.corrected_at)
        .bind(payment.original_amount_cents)
        .bind(payment.updated_at)
        .bind(payment.id)
        .execute(&mut *tx)
        .await?;

        if outcome.affects_balance() {
            recompute_balance(&mut tx, &before).await?;
        }

        let after = invoice::fetch_required(&mut tx, payment.invoice_id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::updated(entity::INVOICE, before.id, actor, before.snapshot(), after.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            payment_id,
            invoice_id = payment.invoice_id,
            amount_cents = payment.amount_cents,
            original_amount_cents = ?payment.original_amount_cents,
            paid_cents = after.paid_cents,
            "Payment corrected"
        );
        Ok(payment)
    }

    /// Removes a payment and recomputes the invoice balance from the rest.
    pub async fn delete(&self, payment_id: i64, actor: &Actor) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        lock_parent(&mut tx, payment_id).await?;
        let payment = find(&mut tx, payment_id)
            .await?
            .ok_or_else(|| DbError::not_found("InvoicePayment", payment_id))?;
        let before = invoice::fetch_required(&mut tx, payment.invoice_id).await?;

        sqlx::query("DELETE FROM invoice_payments WHERE id = ?1")
            .bind(payment_id)
            .execute(&mut *tx)
            .await?;

        recompute_balance(&mut tx, &before).await?;

        let after = invoice::fetch_required(&mut tx, payment.invoice_id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::updated(entity::INVOICE, before.id, actor, before.snapshot(), after.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            payment_id,
            invoice_id = payment.invoice_id,
            paid_cents = after.paid_cents,
            "Payment deleted"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{free_line, manager, walk_in};
    use crate::{Database, DbConfig};
    use steel_core::audit::AuditAction;
    use steel_core::invoice::PaymentStatus;
    use steel_core::payment::confirmed_total;
    use steel_core::{CoreError, PageRequest};

    /// Database with one invoice of total 300.
    async fn setup() -> (Database, Invoice) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let invoice = db
            .invoices()
            .create(walk_in(vec![free_line(3.0, 100)]), &manager())
            .await
            .unwrap();
        (db, invoice)
    }

    fn pay(amount_cents: i64) -> RegisterPaymentRequest {
        RegisterPaymentRequest {
            amount_cents,
            payment_method: Some("bank_transfer".into()),
            payment_date: None,
            transaction_reference: Some("VCB-0001".into()),
            notes: None,
        }
    }

    async fn assert_ledger_matches(db: &Database, invoice_id: i64) -> Invoice {
        let invoice = db.invoices().get_by_id(invoice_id).await.unwrap().unwrap();
        assert_eq!(confirmed_total(&invoice.payments).cents(), invoice.paid_cents);
        invoice
    }

    #[tokio::test]
    async fn test_partial_then_full_payment() {
        let (db, invoice) = setup().await;
        assert_eq!(invoice.total_cents, 300);

        db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();
        let after_first = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(after_first.paid_cents, 100);
        assert_eq!(after_first.payment_status, PaymentStatus::Partial);

        db.payments().register(invoice.id, pay(200), &manager()).await.unwrap();
        let after_second = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(after_second.paid_cents, 300);
        assert_eq!(after_second.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_register_defaults_method_to_cash() {
        let (db, invoice) = setup().await;
        let req = RegisterPaymentRequest {
            payment_method: None,
            ..pay(50)
        };
        let payment = db.payments().register(invoice.id, req, &manager()).await.unwrap();
        assert_eq!(payment.payment_method, "cash");
        assert_eq!(payment.status, LedgerStatus::Confirmed);
        assert_eq!(payment.created_by, Some(2));
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let (db, invoice) = setup().await;

        let err = db.payments().register(invoice.id, pay(0), &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));

        let err = db.payments().register(9_999, pay(100), &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        db.invoices().delete(invoice.id, &manager()).await.unwrap();
        let err = db.payments().register(invoice.id, pay(100), &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_oversized_payments_rejected_and_rolled_back() {
        let (db, invoice) = setup().await;

        let err = db.payments().register(invoice.id, pay(i64::MAX), &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));

        db.payments()
            .register(invoice.id, pay(steel_core::MAX_AMOUNT_CENTS), &manager())
            .await
            .unwrap();
        let err = db.payments().register(invoice.id, pay(1), &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));

        let after = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(after.paid_cents, steel_core::MAX_AMOUNT_CENTS);
        assert_eq!(after.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_correction_preserves_original_amount() {
        let (db, invoice) = setup().await;
        let payment = db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();

        let corrected = db
            .payments()
            .correct(
                payment.id,
                CorrectPaymentRequest {
                    amount_cents: Some(150),
                    correction_reason: Some("Nhập sai số tiền".into()),
                    ..CorrectPaymentRequest::default()
                },
                &manager(),
            )
            .await
            .unwrap();

        assert_eq!(corrected.amount_cents, 150);
        assert_eq!(corrected.original_amount_cents, Some(100));
        assert_eq!(corrected.corrected_by, Some(2));
        assert!(corrected.corrected_at.is_some());

        let invoice = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(invoice.paid_cents, 150);
        assert_eq!(invoice.payment_status, PaymentStatus::Partial);
    }

    #[tokio::test]
    async fn test_second_correction_keeps_first_original() {
        let (db, invoice) = setup().await;
        let payment = db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();

        for amount in [150, 120] {
            db.payments()
                .correct(
                    payment.id,
                    CorrectPaymentRequest {
                        amount_cents: Some(amount),
                        correction_reason: Some("Sửa lại".into()),
                        ..CorrectPaymentRequest::default()
                    },
                    &manager(),
                )
                .await
                .unwrap();
        }

        let stored = db.payments().get_by_id(payment.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_cents, 120);
        assert_eq!(stored.original_amount_cents, Some(100));
        assert_eq!(assert_ledger_matches(&db, invoice.id).await.paid_cents, 120);
    }

    #[tokio::test]
    async fn test_void_recomputes_balance() {
        let (db, invoice) = setup().await;
        db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();
        let second = db.payments().register(invoice.id, pay(200), &manager()).await.unwrap();

        db.payments()
            .correct(
                second.id,
                CorrectPaymentRequest {
                    status: Some(LedgerStatus::Voided),
                    ..CorrectPaymentRequest::default()
                },
                &manager(),
            )
            .await
            .unwrap();

        let invoice = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(invoice.paid_cents, 100);
        assert_eq!(invoice.payment_status, PaymentStatus::Partial);
        assert_eq!(invoice.payments.len(), 2);
    }

    #[tokio::test]
    async fn test_correction_without_reason_keeps_history_empty() {
        let (db, invoice) = setup().await;
        let payment = db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();

        let corrected = db
            .payments()
            .correct(
                payment.id,
                CorrectPaymentRequest {
                    notes: Some("Khách chuyển khoản".into()),
                    ..CorrectPaymentRequest::default()
                },
                &manager(),
            )
            .await
            .unwrap();

        assert_eq!(corrected.amount_cents, 100);
        assert_eq!(corrected.original_amount_cents, None);
        assert_eq!(corrected.notes.as_deref(), Some("Khách chuyển khoản"));
    }

    #[tokio::test]
    async fn test_delete_recomputes_balance() {
        let (db, invoice) = setup().await;
        let first = db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();
        db.payments().register(invoice.id, pay(200), &manager()).await.unwrap();

        db.payments().delete(first.id, &manager()).await.unwrap();

        let invoice = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(invoice.paid_cents, 200);
        assert_eq!(invoice.payment_status, PaymentStatus::Partial);
        assert!(db.payments().get_by_id(first.id).await.unwrap().is_none());

        let err = db.payments().delete(first.id, &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_payment_correction() {
        let (db, _) = setup().await;
        let err = db
            .payments()
            .correct(404, CorrectPaymentRequest::default(), &manager())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ledger_writes_are_audited() {
        let (db, invoice) = setup().await;
        db.payments().register(invoice.id, pay(100), &manager()).await.unwrap();

        let logs = db
            .audit_logs()
            .list_by_entity(entity::INVOICE, invoice.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(logs.total, 2);
        assert_eq!(logs.items[0].action, AuditAction::Updated);
        assert!(logs.items[0].changes_summary.contains("paid_amount: 0.00 → 1.00"));
        assert!(logs.items[0].changes_summary.contains("payment_status: pending → partial"));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_do_not_lose_updates() {
        let dir = std::env::temp_dir().join(format!("steel-ledger-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&dir);
        let db = Database::new(DbConfig::new(&dir)).await.unwrap();
        let invoice = db
            .invoices()
            .create(walk_in(vec![free_line(10.0, 100)]), &manager())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let repo = db.payments();
            let id = invoice.id;
            handles.push(tokio::spawn(async move {
                repo.register(id, pay(100), &manager()).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let invoice = assert_ledger_matches(&db, invoice.id).await;
        assert_eq!(invoice.paid_cents, 500);

        db.close().await;
        let _ = std::fs::remove_file(&dir);
    }
}
