//! # Invoice Repository
//!
//! Persistence for the invoice aggregate. Each mutation is a single
//! transaction that also writes its inventory movements and audit row.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. next_code(invoice)           ← takes the write lock                │
//! │   2. resolve customer             ← by id, or find-or-create by phone  │
//! │   3. InvoiceDraft::build          ← totals + payment status (pure)     │
//! │   4. copy catalog snapshots into variant-bound lines                   │
//! │   5. INSERT invoice, items                                             │
//! │   6. INSERT upfront payment       (if paid > 0)                        │
//! │   7. INSERT sale movements        (variant-bound lines, log only)      │
//! │   8. INSERT audit row (created)                                        │
//! │  COMMIT                           ← any failure rolls back all of it   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deletion is soft: the invoice moves to `cancelled` and stays readable.

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use steel_core::audit::{entity, NewAuditEntry};
use steel_core::customer::{CustomerSnapshot, NewCustomer};
use steel_core::inventory::NewMovement;
use steel_core::invoice::{
    CreateInvoiceRequest, Invoice, InvoiceDraft, InvoiceFilter, InvoiceItem, InvoiceLine,
    InvoiceStatus, InvoiceSummary, UpdateInvoiceRequest,
};
use steel_core::validation::validate_search_query;
use steel_core::{Actor, CodeSequence, PageRequest, Paginated, ValidationError};
use tracing::{debug, info};

use super::{audit, customer, inventory, like_pattern, payment, product, sequence};
use crate::error::{DbError, DbResult};

const INVOICE_COLUMNS: &str = "id, invoice_code, customer_id, customer_name, customer_phone, \
    customer_address, subtotal_cents, discount_cents, discount_bps, tax_cents, tax_bps, \
    total_cents, paid_cents, payment_status, status, payment_method, notes, \
    created_by, created_by_name, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, invoice_id, product_id, variant_id, product_name, variant_name, \
    unit, quantity, unit_price_cents, total_price_cents, product_notes, created_at, updated_at";

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Touches the invoice row so the caller's transaction holds the write lock
/// before it reads anything. Fails with NotFound for an unknown id.
pub(crate) async fn lock(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE invoices SET updated_at = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", id));
    }
    Ok(())
}

/// Loads an invoice with its items and payments.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {} FROM invoices WHERE id = ?1",
        INVOICE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut invoice) = invoice else {
        return Ok(None);
    };

    invoice.items = sqlx::query_as::<_, InvoiceItem>(&format!(
        "SELECT {} FROM invoice_items WHERE invoice_id = ?1 ORDER BY id",
        ITEM_COLUMNS
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    invoice.payments = payment::list_for_invoice(conn, id).await?;

    Ok(Some(invoice))
}

pub(crate) async fn fetch_required(conn: &mut SqliteConnection, id: i64) -> DbResult<Invoice> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", id))
}

/// Persists `paid_cents` and `payment_status` of an in-memory invoice.
pub(crate) async fn store_paid(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query("UPDATE invoices SET paid_cents = ?1, payment_status = ?2, updated_at = ?3 WHERE id = ?4")
        .bind(invoice.paid_cents)
        .bind(invoice.payment_status)
        .bind(Utc::now())
        .bind(invoice.id)
        .execute(&mut *conn)
        .await?;

    debug!(
        invoice_id = invoice.id,
        paid_cents = invoice.paid_cents,
        payment_status = invoice.payment_status.as_str(),
        "Stored invoice balance"
    );
    Ok(())
}

/// Customer fields for the header: by id when given (NotFound otherwise),
/// else find-or-create by phone.
async fn resolve_customer(conn: &mut SqliteConnection, req: &CreateInvoiceRequest) -> DbResult<CustomerSnapshot> {
    let stored = match req.customer_id {
        Some(id) => customer::find_by_id(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?,
        None => {
            let new_customer = NewCustomer {
                phone: req.customer_phone.clone().unwrap_or_default(),
                name: req.customer_name.clone().unwrap_or_default(),
                address: req.customer_address.clone(),
            };
            customer::get_or_create_by_phone(conn, &new_customer).await?
        }
    };

    Ok(CustomerSnapshot::from_directory(
        &stored,
        req.customer_phone.as_deref(),
        req.customer_name.as_deref(),
        req.customer_address.as_deref(),
    ))
}

/// Copies product/variant display fields into variant-bound lines.
/// Values supplied by the caller win. A `product_id` that does not own the
/// variant is rejected.
async fn fill_catalog_snapshots(conn: &mut SqliteConnection, lines: &mut [InvoiceLine]) -> DbResult<()> {
    for (i, line) in lines.iter_mut().enumerate() {
        let Some(variant_id) = line.variant_id else {
            continue;
        };

        let snapshot = product::variant_snapshot(conn, variant_id).await?;
        if let Some(product_id) = line.product_id.filter(|&id| id != snapshot.product_id) {
            return Err(ValidationError::InvalidFormat {
                field: format!("items[{}].product_id", i),
                reason: format!(
                    "variant {} belongs to product {}, not {}",
                    variant_id, snapshot.product_id, product_id
                ),
            }
            .into());
        }
        line.product_id = Some(snapshot.product_id);
        if line.needs_catalog_snapshot() {
            line.product_name = snapshot.product_name;
        }
        if line.variant_name.is_none() {
            line.variant_name = Some(snapshot.variant_name);
        }
        if line.unit.is_none() {
            line.unit = Some(snapshot.unit);
        }
    }
    Ok(())
}

async fn insert_items(
    conn: &mut SqliteConnection,
    invoice_id: i64,
    lines: &[InvoiceLine],
    now: DateTime<Utc>,
) -> DbResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (
                invoice_id, product_id, variant_id, product_name, variant_name, unit,
                quantity, unit_price_cents, total_price_cents, product_notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            "#,
        )
        .bind(invoice_id)
        .bind(line.product_id)
        .bind(line.variant_id)
        .bind(line.product_name.trim())
        .bind(line.variant_name.as_deref())
        .bind(line.unit.as_deref())
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total().cents())
        .bind(line.product_notes.as_deref())
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    debug!(invoice_id, lines = lines.len(), "Inserted invoice items");
    Ok(())
}

async fn write_header(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        UPDATE invoices SET
            customer_name = ?1,
            customer_phone = ?2,
            customer_address = ?3,
            subtotal_cents = ?4,
            discount_cents = ?5,
            discount_bps = ?6,
            tax_cents = ?7,
            tax_bps = ?8,
            total_cents = ?9,
            paid_cents = ?10,
            payment_status = ?11,
            status = ?12,
            payment_method = ?13,
            notes = ?14,
            updated_at = ?15
        WHERE id = ?16
        "#,
    )
    .bind(&invoice.customer_name)
    .bind(&invoice.customer_phone)
    .bind(invoice.customer_address.as_deref())
    .bind(invoice.subtotal_cents)
    .bind(invoice.discount_cents)
    .bind(invoice.discount_bps)
    .bind(invoice.tax_cents)
    .bind(invoice.tax_bps)
    .bind(invoice.total_cents)
    .bind(invoice.paid_cents)
    .bind(invoice.payment_status)
    .bind(invoice.status)
    .bind(invoice.payment_method.as_deref())
    .bind(invoice.notes.as_deref())
    .bind(Utc::now())
    .bind(invoice.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &InvoiceFilter, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        qb.push(" AND (invoice_code LIKE ")
            .push_bind(pattern.to_string())
            .push(" OR customer_name LIKE ")
            .push_bind(pattern.to_string())
            .push(" OR customer_phone LIKE ")
            .push_bind(pattern.to_string())
            .push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(payment_status) = filter.payment_status {
        qb.push(" AND payment_status = ").push_bind(payment_status);
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates an invoice with its items, optional upfront payment, sale
    /// movements and audit row, all in one transaction.
    ///
    /// ## Errors
    /// - `Rule(Validation)` for an empty item list, bad quantities or prices,
    ///   a discount above the subtotal
    /// - `NotFound` for an unknown `customer_id` or line `variant_id`
    pub async fn create(&self, req: CreateInvoiceRequest, actor: &Actor) -> DbResult<Invoice> {
        req.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let code = sequence::next_code(&mut tx, CodeSequence::Invoice).await?;
        let customer = resolve_customer(&mut tx, &req).await?;
        let mut draft = InvoiceDraft::build(&req, customer)?;
        fill_catalog_snapshots(&mut tx, &mut draft.lines).await?;

        let id = sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_code, customer_id, customer_name, customer_phone, customer_address,
                subtotal_cents, discount_cents, discount_bps, tax_cents, tax_bps, total_cents,
                paid_cents, payment_status, status, payment_method, notes,
                created_by, created_by_name, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?19
            )
            "#,
        )
        .bind(&code)
        .bind(draft.customer.id)
        .bind(&draft.customer.name)
        .bind(&draft.customer.phone)
        .bind(draft.customer.address.as_deref())
        .bind(draft.totals.subtotal.cents())
        .bind(draft.totals.discount.cents())
        .bind(draft.totals.discount_rate.map(|r| r.bps()))
        .bind(draft.totals.tax.cents())
        .bind(draft.totals.tax_rate.map(|r| r.bps()))
        .bind(draft.totals.total.cents())
        .bind(draft.paid.cents())
        .bind(draft.payment_status)
        .bind(InvoiceStatus::Confirmed)
        .bind(draft.payment_method.as_deref())
        .bind(draft.notes.as_deref())
        .bind(actor.user_id)
        .bind(actor.user_name.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_items(&mut tx, id, &draft.lines, now).await?;

        if let Some(upfront) = &draft.upfront_payment {
            payment::insert(&mut tx, id, upfront, actor.user_id).await?;
        }

        for line in &draft.lines {
            if let Some(movement) = NewMovement::sale(line, id, &code, actor.user_id) {
                inventory::record(&mut tx, &movement).await?;
            }
        }

        let invoice = fetch_required(&mut tx, id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::created(entity::INVOICE, id, actor, invoice.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            invoice_id = id,
            invoice_code = %invoice.invoice_code,
            total_cents = invoice.total_cents,
            payment_status = invoice.payment_status.as_str(),
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Gets an invoice with items and payments.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets an invoice by its printed code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;

        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM invoices WHERE invoice_code = ?1")
            .bind(code.trim())
            .fetch_optional(&mut *conn)
            .await?;

        match id {
            Some(id) => fetch(&mut conn, id).await,
            None => Ok(None),
        }
    }

    /// Lists invoice headers, newest first. Items and payments are not loaded.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Paginated<Invoice>> {
        let page = PageRequest::new(filter.page, filter.limit);
        let pattern = validate_search_query(filter.search.as_deref())?.map(|s| like_pattern(&s));

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices WHERE 1 = 1");
        push_filters(&mut count_qb, filter, pattern.as_deref());
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM invoices WHERE 1 = 1",
            INVOICE_COLUMNS
        ));
        push_filters(&mut qb, filter, pattern.as_deref());
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items: Vec<Invoice> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(Paginated::new(items, total, page))
    }

    /// Totals over all non-cancelled invoices, plus today's share (UTC day).
    pub async fn summary(&self) -> DbResult<InvoiceSummary> {
        let today_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();

        let summary = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT
                COUNT(*) AS invoice_count,
                COALESCE(SUM(total_cents), 0) AS total_cents,
                COALESCE(SUM(paid_cents), 0) AS paid_cents,
                COALESCE(SUM(MAX(total_cents - paid_cents, 0)), 0) AS outstanding_cents,
                COALESCE(SUM(CASE WHEN created_at >= ?1 THEN 1 ELSE 0 END), 0) AS today_count,
                COALESCE(SUM(CASE WHEN created_at >= ?1 THEN total_cents ELSE 0 END), 0) AS today_total_cents
            FROM invoices
            WHERE status != 'cancelled'
            "#,
        )
        .bind(today_start)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Applies a partial update.
    ///
    /// Supplied items replace all stored lines (delete then reinsert) and
    /// totals are recomputed. `paid_cents` overrides the balance directly,
    /// without a ledger row.
    pub async fn update(&self, id: i64, req: UpdateInvoiceRequest, actor: &Actor) -> DbResult<Invoice> {
        req.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        lock(&mut tx, id).await?;
        let before = fetch_required(&mut tx, id).await?;

        let mut invoice = before.clone();
        if let Some(mut lines) = invoice.apply_update(&req)? {
            fill_catalog_snapshots(&mut tx, &mut lines).await?;

            sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_items(&mut tx, id, &lines, now).await?;
        }
        write_header(&mut tx, &invoice).await?;

        let after = fetch_required(&mut tx, id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::updated(entity::INVOICE, id, actor, before.snapshot(), after.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            invoice_id = id,
            total_cents = after.total_cents,
            paid_cents = after.paid_cents,
            "Invoice updated"
        );
        Ok(after)
    }

    /// Soft-deletes: the invoice becomes `cancelled`.
    pub async fn delete(&self, id: i64, actor: &Actor) -> DbResult<Invoice> {
        let mut tx = self.pool.begin().await?;

        lock(&mut tx, id).await?;
        let before = fetch_required(&mut tx, id).await?;

        sqlx::query("UPDATE invoices SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(InvoiceStatus::Cancelled)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let after = fetch_required(&mut tx, id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::deleted(entity::INVOICE, id, actor, before.snapshot(), Some(after.snapshot())),
        )
        .await?;

        tx.commit().await?;

        info!(invoice_id = id, invoice_code = %after.invoice_code, "Invoice cancelled");
        Ok(after)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
