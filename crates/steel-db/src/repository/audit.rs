//! # Audit Log Repository
//!
//! Persistence for the audit trail. Rows are written inside the transaction
//! of the mutation they describe and never updated afterwards; the only
//! other write is administrative deletion.
//!
//! Snapshots are stored as JSON text and decoded back into
//! `serde_json::Value` on read.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use steel_core::audit::{AuditAction, AuditFilter, AuditLog, NewAuditEntry};
use steel_core::{PageRequest, Paginated};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

const AUDIT_COLUMNS: &str = "id, entity_type, entity_id, action, user_id, user_name, \
    old_data, new_data, changes_summary, ip_address, user_agent, created_at";

/// Raw row; JSON columns are still text.
#[derive(Debug, sqlx::FromRow)]
struct AuditLogRow {
    id: i64,
    entity_type: String,
    entity_id: i64,
    action: AuditAction,
    user_id: Option<i64>,
    user_name: Option<String>,
    old_data: Option<String>,
    new_data: Option<String>,
    changes_summary: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLog {
    type Error = DbError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let decode = |text: Option<String>| -> DbResult<Option<serde_json::Value>> {
            text.map(|t| serde_json::from_str(&t)).transpose().map_err(DbError::from)
        };

        Ok(AuditLog {
            id: row.id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            action: row.action,
            user_id: row.user_id,
            user_name: row.user_name,
            old_data: decode(row.old_data)?,
            new_data: decode(row.new_data)?,
            changes_summary: row.changes_summary,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

/// Writes one audit row on the given connection (usually a transaction).
pub(crate) async fn record(conn: &mut SqliteConnection, entry: &NewAuditEntry) -> DbResult<i64> {
    let old_data = entry.old_data.as_ref().map(serde_json::to_string).transpose()?;
    let new_data = entry.new_data.as_ref().map(serde_json::to_string).transpose()?;
    let summary = entry.changes_summary();

    let id = sqlx::query(
        r#"
        INSERT INTO audit_logs (
            entity_type, entity_id, action, user_id, user_name,
            old_data, new_data, changes_summary, ip_address, user_agent, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.action)
    .bind(entry.actor.user_id)
    .bind(entry.actor.user_name.as_deref())
    .bind(old_data)
    .bind(new_data)
    .bind(&summary)
    .bind(entry.actor.ip_address.as_deref())
    .bind(entry.actor.user_agent.as_deref())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    debug!(
        audit_id = id,
        entity_type = entry.entity_type,
        entity_id = entry.entity_id,
        action = ?entry.action,
        summary = %summary,
        "Recorded audit entry"
    );

    Ok(id)
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &AuditFilter) {
    if let Some(entity_type) = &filter.entity_type {
        qb.push(" AND entity_type = ").push_bind(entity_type.clone());
    }
    if let Some(entity_id) = filter.entity_id {
        qb.push(" AND entity_id = ").push_bind(entity_id);
    }
    if let Some(action) = filter.action {
        qb.push(" AND action = ").push_bind(action);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(from) = filter.from_instant() {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to_instant_exclusive() {
        qb.push(" AND created_at < ").push_bind(to);
    }
}

/// Repository for the audit trail.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    /// Creates a new AuditLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Records a standalone change (outside any other unit of work).
    pub async fn record(&self, entry: NewAuditEntry) -> DbResult<AuditLog> {
        let mut conn = self.pool.acquire().await?;
        let id = record(&mut conn, &entry).await?;
        drop(conn);

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("AuditLog", id))
    }

    /// Gets one audit row.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<AuditLog>> {
        let row: Option<AuditLogRow> =
            sqlx::query_as(&format!("SELECT {} FROM audit_logs WHERE id = ?1", AUDIT_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(AuditLog::try_from).transpose()
    }

    /// History of one entity, newest first.
    pub async fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: i64,
        page: PageRequest,
    ) -> DbResult<Paginated<AuditLog>> {
        let filter = AuditFilter {
            entity_type: Some(entity_type.to_string()),
            entity_id: Some(entity_id),
            ..AuditFilter::default()
        };
        self.query(&filter, page).await
    }

    /// Filtered listing, newest first.
    pub async fn list(&self, filter: &AuditFilter) -> DbResult<Paginated<AuditLog>> {
        let page = PageRequest::new(filter.page, filter.limit);
        self.query(filter, page).await
    }

    async fn query(&self, filter: &AuditFilter, page: PageRequest) -> DbResult<Paginated<AuditLog>> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM audit_logs WHERE 1 = 1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM audit_logs WHERE 1 = 1",
            AUDIT_COLUMNS
        ));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows: Vec<AuditLogRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(AuditLog::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Paginated::new(items, total, page))
    }

    /// Administrative deletion.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("AuditLog", id));
        }

        info!(audit_id = id, "Audit log deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
