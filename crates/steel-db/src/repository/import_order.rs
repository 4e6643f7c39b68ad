//! # Import Order Repository
//!
//! Purchasing documents. Lines snapshot the catalog when written; stock only
//! moves when an order is approved.
//!
//! ## Approval
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. UPDATE ... SET status = 'approved' WHERE status = 'pending'        │
//! │        0 rows → NotFound (no order) | Conflict (already approved)       │
//! │   2. per item:                                                          │
//! │        prev = stock(variant)                                            │
//! │        stock(variant) += quantity                                       │
//! │        movement { import, +quantity, prev, prev + quantity }            │
//! │   3. audit row (pending → approved)                                     │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The conditional update is the gate: of two racing approvals exactly one
//! sees a pending row.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use steel_core::audit::{entity, NewAuditEntry};
use steel_core::catalog::VariantSnapshot;
use steel_core::import_order::{
    import_total, ApproveImportOrderRequest, CreateImportOrderRequest, ImportLine, ImportOrder,
    ImportOrderFilter, ImportOrderItem, ImportStatus, UpdateImportOrderRequest, NOT_PENDING,
};
use steel_core::inventory::NewMovement;
use steel_core::error::ValidationError;
use steel_core::validation::validate_search_query;
use steel_core::{Actor, CodeSequence, PageRequest, Paginated};
use tracing::{debug, info, warn};

use super::{audit, inventory, like_pattern, product, sequence};
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, import_code, supplier_name, import_date, total_cents, status, notes, \
    approved_by, approved_by_name, approved_at, approval_note, created_by, created_by_name, \
    created_at, updated_at";

const ITEM_COLUMNS: &str = "id, import_order_id, product_id, variant_id, product_name, variant_name, \
    unit, quantity, unit_price_cents, total_price_cents, notes";

// =============================================================================
// Transaction helpers
// =============================================================================

async fn fetch(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<ImportOrder>> {
    let order = sqlx::query_as::<_, ImportOrder>(&format!(
        "SELECT {} FROM import_orders WHERE id = ?1",
        ORDER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match order {
        Some(mut order) => {
            order.items = sqlx::query_as::<_, ImportOrderItem>(&format!(
                "SELECT {} FROM import_order_items WHERE import_order_id = ?1 ORDER BY id",
                ITEM_COLUMNS
            ))
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

async fn fetch_required(conn: &mut SqliteConnection, id: i64) -> DbResult<ImportOrder> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("ImportOrder", id))
}

/// Write-touches the order row so the transaction holds the write lock.
async fn lock(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE import_orders SET updated_at = ?1 WHERE id = ?2")
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ImportOrder", id));
    }
    Ok(())
}

/// Looks up every line's variant and checks the stated product matches.
async fn resolve_lines(
    conn: &mut SqliteConnection,
    lines: &[ImportLine],
) -> DbResult<Vec<VariantSnapshot>> {
    let mut snapshots = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let snapshot = product::variant_snapshot(conn, line.variant_id).await?;
        if snapshot.product_id != line.product_id {
            return Err(ValidationError::InvalidFormat {
                field: format!("items[{}].product_id", i),
                reason: format!(
                    "variant {} belongs to product {}",
                    line.variant_id, snapshot.product_id
                ),
            }
            .into());
        }
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}

async fn insert_items(
    conn: &mut SqliteConnection,
    order_id: i64,
    lines: &[ImportLine],
    snapshots: &[VariantSnapshot],
) -> DbResult<()> {
    for (line, snapshot) in lines.iter().zip(snapshots) {
        sqlx::query(
            r#"
            INSERT INTO import_order_items (
                import_order_id, product_id, variant_id, product_name, variant_name,
                unit, quantity, unit_price_cents, total_price_cents, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(order_id)
        .bind(snapshot.product_id)
        .bind(snapshot.variant_id)
        .bind(&snapshot.product_name)
        .bind(&snapshot.variant_name)
        .bind(&snapshot.unit)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total().cents())
        .bind(line.notes.as_deref())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ImportOrderFilter, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        qb.push(" AND (import_code LIKE ")
            .push_bind(pattern.to_string())
            .push(" OR supplier_name LIKE ")
            .push_bind(pattern.to_string())
            .push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for import orders.
#[derive(Debug, Clone)]
pub struct ImportOrderRepository {
    pool: SqlitePool,
}

impl ImportOrderRepository {
    /// Creates a new ImportOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ImportOrderRepository { pool }
    }

    /// Creates a pending order. Stock is untouched until approval.
    ///
    /// ## Errors
    /// - `Rule(Validation)` for a missing supplier, no lines, bad quantities,
    ///   or a line whose `product_id` is not the variant's product
    /// - `NotFound` for an unknown variant
    pub async fn create(&self, req: CreateImportOrderRequest, actor: &Actor) -> DbResult<ImportOrder> {
        req.validate()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let code = sequence::next_code(&mut tx, CodeSequence::ImportOrder).await?;
        let snapshots = resolve_lines(&mut tx, &req.items).await?;

        let id = sqlx::query(
            r#"
            INSERT INTO import_orders (
                import_code, supplier_name, import_date, total_cents, status, notes,
                created_by, created_by_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&code)
        .bind(req.supplier_name.trim())
        .bind(req.import_date.unwrap_or(now))
        .bind(import_total(&req.items)?.cents())
        .bind(ImportStatus::Pending)
        .bind(req.notes.as_deref())
        .bind(actor.user_id)
        .bind(actor.user_name.as_deref())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        insert_items(&mut tx, id, &req.items, &snapshots).await?;

        let created = fetch_required(&mut tx, id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::created(entity::IMPORT_ORDER, id, actor, created.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            import_order_id = id,
            import_code = %code,
            items = created.items.len(),
            total_cents = created.total_cents,
            "Import order created"
        );
        Ok(created)
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<ImportOrder>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Lists order headers, newest first.
    pub async fn list(&self, filter: &ImportOrderFilter) -> DbResult<Paginated<ImportOrder>> {
        let page = PageRequest::new(filter.page, filter.limit);
        let pattern = validate_search_query(filter.search.as_deref())?.map(|s| like_pattern(&s));

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM import_orders WHERE 1 = 1");
        push_filters(&mut count_qb, filter, pattern.as_deref());
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM import_orders WHERE 1 = 1",
            ORDER_COLUMNS
        ));
        push_filters(&mut qb, filter, pattern.as_deref());
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let items: Vec<ImportOrder> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(Paginated::new(items, total, page))
    }

    /// Partial update of a pending order. Supplied items replace all lines
    /// and the total is recomputed from them.
    pub async fn update(
        &self,
        id: i64,
        req: UpdateImportOrderRequest,
        actor: &Actor,
    ) -> DbResult<ImportOrder> {
        req.validate()?;

        let mut tx = self.pool.begin().await?;

        lock(&mut tx, id).await?;
        let before = fetch_required(&mut tx, id).await?;
        before.ensure_pending()?;

        let supplier_name = req
            .supplier_name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&before.supplier_name);
        let import_date: DateTime<Utc> = req.import_date.unwrap_or(before.import_date);
        let notes = req.notes.as_deref().or(before.notes.as_deref());

        let total_cents = match &req.items {
            Some(lines) => {
                let snapshots = resolve_lines(&mut tx, lines).await?;
                sqlx::query("DELETE FROM import_order_items WHERE import_order_id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_items(&mut tx, id, lines, &snapshots).await?;
                import_total(lines)?.cents()
            }
            None => before.total_cents,
        };

        sqlx::query(
            r#"
            UPDATE import_orders SET
                supplier_name = ?1,
                import_date = ?2,
                notes = ?3,
                total_cents = ?4,
                updated_at = ?5
            WHERE id = ?6
            "#,
        )
        .bind(supplier_name)
        .bind(import_date)
        .bind(notes)
        .bind(total_cents)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let after = fetch_required(&mut tx, id).await?;
        audit::record(
            &mut tx,
            &NewAuditEntry::updated(entity::IMPORT_ORDER, id, actor, before.snapshot(), after.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(import_order_id = id, total_cents = after.total_cents, "Import order updated");
        Ok(after)
    }

    /// Approves a pending order and receives its stock.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown order
    /// - `Rule(Conflict)` when the order is already approved
    pub async fn approve(
        &self,
        id: i64,
        req: ApproveImportOrderRequest,
        actor: &Actor,
    ) -> DbResult<ImportOrder> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE import_orders SET
                status = ?1,
                approved_by = ?2,
                approved_by_name = ?3,
                approved_at = ?4,
                approval_note = ?5,
                updated_at = ?4
            WHERE id = ?6 AND status = ?7
            "#,
        )
        .bind(ImportStatus::Approved)
        .bind(actor.user_id)
        .bind(actor.user_name.as_deref())
        .bind(now)
        .bind(req.approval_note.as_deref())
        .bind(id)
        .bind(ImportStatus::Pending)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return match fetch(&mut tx, id).await? {
                Some(_) => {
                    warn!(import_order_id = id, "Approval rejected, order not pending");
                    Err(DbError::conflict(NOT_PENDING))
                }
                None => Err(DbError::not_found("ImportOrder", id)),
            };
        }

        let approved = fetch_required(&mut tx, id).await?;

        for item in &approved.items {
            let previous = product::variant_stock(&mut tx, item.variant_id).await?;
            product::adjust_stock(&mut tx, item.variant_id, item.quantity).await?;
            inventory::record(
                &mut tx,
                &NewMovement::import(item, &approved.import_code, previous, actor.user_id),
            )
            .await?;
            debug!(
                variant_id = item.variant_id,
                previous_stock = previous,
                quantity = item.quantity,
                "Received import line"
            );
        }

        let mut pending = approved.clone();
        pending.status = ImportStatus::Pending;
        pending.approved_by = None;
        pending.approved_by_name = None;
        pending.approved_at = None;
        pending.approval_note = None;

        audit::record(
            &mut tx,
            &NewAuditEntry::updated(entity::IMPORT_ORDER, id, actor, pending.snapshot(), approved.snapshot()),
        )
        .await?;

        tx.commit().await?;

        info!(
            import_order_id = id,
            import_code = %approved.import_code,
            items = approved.items.len(),
            "Import order approved"
        );
        Ok(approved)
    }

    /// Deletes a pending order and its lines.
    pub async fn delete(&self, id: i64, actor: &Actor) -> DbResult<ImportOrder> {
        let mut tx = self.pool.begin().await?;

        lock(&mut tx, id).await?;
        let order = fetch_required(&mut tx, id).await?;
        order.ensure_pending()?;

        sqlx::query("DELETE FROM import_order_items WHERE import_order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM import_orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        audit::record(
            &mut tx,
            &NewAuditEntry::deleted(entity::IMPORT_ORDER, id, actor, order.snapshot(), None),
        )
        .await?;

        tx.commit().await?;

        info!(import_order_id = id, import_code = %order.import_code, "Import order deleted");
        Ok(order)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db_with_product, manager};
    use crate::Database;
    use steel_core::audit::AuditAction;
    use steel_core::catalog::Product;
    use steel_core::inventory::{reference, MovementType};
    use steel_core::CoreError;

    fn order_for(product: &Product, quantity: f64) -> CreateImportOrderRequest {
        CreateImportOrderRequest {
            supplier_name: "Thép Hòa Phát".into(),
            import_date: None,
            notes: Some("Giao tại kho".into()),
            items: vec![ImportLine {
                product_id: product.id,
                variant_id: product.variants[0].id,
                quantity,
                unit_price_cents: 28_000_000,
                notes: None,
            }],
        }
    }

    async fn stock_of(db: &Database, variant_id: i64) -> f64 {
        db.products().get_variant(variant_id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_snapshots_lines() {
        let (db, product) = db_with_product().await;
        let order = db.import_orders().create(order_for(&product, 5.0), &manager()).await.unwrap();

        assert_eq!(order.import_code, "IMP-000001");
        assert_eq!(order.status, ImportStatus::Pending);
        assert_eq!(order.total_cents, 140_000_000);
        assert_eq!(order.created_by_name.as_deref(), Some("quan.ly"));
        assert_eq!(order.items[0].product_name, "Thép hộp mạ kẽm");
        assert_eq!(order.items[0].unit.as_deref(), Some("cây"));
        assert_eq!(stock_of(&db, product.variants[0].id).await, 12.0);

        let second = db.import_orders().create(order_for(&product, 1.0), &manager()).await.unwrap();
        assert_eq!(second.import_code, "IMP-000002");
    }

    #[tokio::test]
    async fn test_create_rejects_mismatched_product() {
        let (db, product) = db_with_product().await;
        let mut req = order_for(&product, 1.0);
        req.items[0].product_id = product.id + 100;

        let err = db.import_orders().create(req, &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));

        let mut req = order_for(&product, 1.0);
        req.items[0].variant_id = 999;
        let err = db.import_orders().create(req, &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_approve_receives_stock() {
        let (db, product) = db_with_product().await;
        let variant_id = product.variants[0].id;
        let order = db.import_orders().create(order_for(&product, 5.0), &manager()).await.unwrap();

        let approved = db
            .import_orders()
            .approve(
                order.id,
                ApproveImportOrderRequest {
                    approval_note: Some("Đã kiểm hàng".into()),
                },
                &manager(),
            )
            .await
            .unwrap();

        assert_eq!(approved.status, ImportStatus::Approved);
        assert_eq!(approved.approved_by, Some(2));
        assert!(approved.approved_at.is_some());
        assert_eq!(stock_of(&db, variant_id).await, 17.0);

        let movements = db
            .inventory()
            .list_by_reference(reference::IMPORT_ORDER, order.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Import);
        assert_eq!(movements[0].quantity_change, 5.0);
        assert_eq!(movements[0].previous_stock, Some(12.0));
        assert_eq!(movements[0].new_stock, Some(17.0));

        let logs = db
            .audit_logs()
            .list_by_entity(entity::IMPORT_ORDER, order.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(logs.total, 2);
        assert!(logs.items[0].changes_summary.contains("status: pending → approved"));
    }

    #[tokio::test]
    async fn test_second_approval_conflicts() {
        let (db, product) = db_with_product().await;
        let variant_id = product.variants[0].id;
        let order = db.import_orders().create(order_for(&product, 5.0), &manager()).await.unwrap();

        db.import_orders()
            .approve(order.id, ApproveImportOrderRequest::default(), &manager())
            .await
            .unwrap();
        let err = db
            .import_orders()
            .approve(order.id, ApproveImportOrderRequest::default(), &manager())
            .await
            .unwrap_err();

        match err {
            DbError::Rule(CoreError::Conflict(message)) => assert_eq!(message, NOT_PENDING),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(stock_of(&db, variant_id).await, 17.0);

        let err = db
            .import_orders()
            .approve(404, ApproveImportOrderRequest::default(), &manager())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_approved_order_is_immutable() {
        let (db, product) = db_with_product().await;
        let order = db.import_orders().create(order_for(&product, 5.0), &manager()).await.unwrap();
        db.import_orders()
            .approve(order.id, ApproveImportOrderRequest::default(), &manager())
            .await
            .unwrap();

        let err = db
            .import_orders()
            .update(
                order.id,
                UpdateImportOrderRequest {
                    notes: Some("Sửa".into()),
                    ..UpdateImportOrderRequest::default()
                },
                &manager(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Conflict(_))));

        let err = db.import_orders().delete(order.id, &manager()).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Conflict(_))));
        assert!(db.import_orders().get_by_id(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_replaces_lines() {
        let (db, product) = db_with_product().await;
        let order = db.import_orders().create(order_for(&product, 5.0), &manager()).await.unwrap();

        let updated = db
            .import_orders()
            .update(
                order.id,
                UpdateImportOrderRequest {
                    supplier_name: Some("Thép Pomina".into()),
                    items: Some(vec![ImportLine {
                        product_id: product.id,
                        variant_id: product.variants[1].id,
                        quantity: 100.0,
                        unit_price_cents: 4_000_000,
                        notes: None,
                    }]),
                    ..UpdateImportOrderRequest::default()
                },
                &manager(),
            )
            .await
            .unwrap();

        assert_eq!(updated.supplier_name, "Thép Pomina");
        assert_eq!(updated.notes.as_deref(), Some("Giao tại kho"));
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].unit.as_deref(), Some("m"));
        assert_eq!(updated.total_cents, 400_000_000);
    }

    #[tokio::test]
    async fn test_delete_pending_order() {
        let (db, product) = db_with_product().await;
        let order = db.import_orders().create(order_for(&product, 5.0), &manager()).await.unwrap();

        let deleted = db.import_orders().delete(order.id, &manager()).await.unwrap();
        assert_eq!(deleted.id, order.id);
        assert!(db.import_orders().get_by_id(order.id).await.unwrap().is_none());

        let logs = db
            .audit_logs()
            .list_by_entity(entity::IMPORT_ORDER, order.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(logs.items[0].action, AuditAction::Deleted);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, product) = db_with_product().await;
        let first = db.import_orders().create(order_for(&product, 1.0), &manager()).await.unwrap();
        db.import_orders().create(order_for(&product, 2.0), &manager()).await.unwrap();
        db.import_orders()
            .approve(first.id, ApproveImportOrderRequest::default(), &manager())
            .await
            .unwrap();

        let pending = db
            .import_orders()
            .list(&ImportOrderFilter {
                status: Some(ImportStatus::Pending),
                ..ImportOrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].import_code, "IMP-000002");

        let by_code = db
            .import_orders()
            .list(&ImportOrderFilter {
                search: Some("IMP-000001".into()),
                ..ImportOrderFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_code.total, 1);
        assert_eq!(by_code.items[0].status, ImportStatus::Approved);
    }
}
