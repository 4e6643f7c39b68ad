//! Audit trail endpoints. Entries are written by the repositories; this
//! surface only reads them, plus an admin-only delete.

use axum::extract::State;
use steel_core::audit::{AuditFilter, AuditLog};
use steel_core::Paginated;

use super::PageQuery;
use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::extract::{Path, Query};
use crate::response::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /audit-logs?entity_type=&entity_id=&user_id=&action=&date_from=&date_to=&page=&limit=
#[tracing::instrument(skip(state, _user))]
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<AuditFilter>,
) -> ApiResult<Paginated<AuditLog>> {
    let page = state.db.audit_logs().list(&filter).await?;
    Ok(ApiResponse::ok("Audit logs retrieved", page))
}

/// GET /audit-logs/entity/{entity_type}/{entity_id}
#[tracing::instrument(skip(state, _user))]
pub async fn by_entity(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((entity_type, entity_id)): Path<(String, i64)>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Paginated<AuditLog>> {
    let history = state
        .db
        .audit_logs()
        .list_by_entity(&entity_type, entity_id, page.into())
        .await?;
    Ok(ApiResponse::ok("Entity history retrieved", history))
}

/// GET /audit-logs/id/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<AuditLog> {
    let entry = state
        .db
        .audit_logs()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("AuditLog", id))?;
    Ok(ApiResponse::ok("Audit log retrieved", entry))
}

/// DELETE /audit-logs/id/{id}
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require(Role::Admin)?;
    state.db.audit_logs().delete(id).await?;
    Ok(ApiResponse::message("Audit log deleted"))
}
