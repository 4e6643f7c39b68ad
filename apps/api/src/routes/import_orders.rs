//! Import order endpoints.
//!
//! Orders are editable while pending. Approval receives every line into
//! stock in one transaction and freezes the order.

use axum::body::Bytes;
use axum::extract::State;
use steel_core::import_order::{
    ApproveImportOrderRequest, CreateImportOrderRequest, ImportOrder, ImportOrderFilter,
    UpdateImportOrderRequest,
};
use steel_core::Paginated;

use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::response::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /import-orders?search=&status=&page=&limit=
#[tracing::instrument(skip(state, _user))]
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<ImportOrderFilter>,
) -> ApiResult<Paginated<ImportOrder>> {
    let page = state.db.import_orders().list(&filter).await?;
    Ok(ApiResponse::ok("Import orders retrieved", page))
}

/// GET /import-orders/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<ImportOrder> {
    let order = state
        .db
        .import_orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("ImportOrder", id))?;
    Ok(ApiResponse::ok("Import order retrieved", order))
}

/// POST /import-orders
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateImportOrderRequest>,
) -> ApiResult<ImportOrder> {
    user.require(Role::Manager)?;
    let order = state.db.import_orders().create(req, &user.actor()).await?;
    Ok(ApiResponse::created("Import order created", order))
}

/// PUT /import-orders/{id}
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateImportOrderRequest>,
) -> ApiResult<ImportOrder> {
    user.require(Role::Manager)?;
    let order = state
        .db
        .import_orders()
        .update(id, req, &user.actor())
        .await?;
    Ok(ApiResponse::ok("Import order updated", order))
}

/// POST /import-orders/{id}/approve
///
/// The body is optional; an empty body approves without notes.
#[tracing::instrument(skip(state, user, body), fields(user_id = user.user_id))]
pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<ImportOrder> {
    user.require(Role::Manager)?;

    let req = if body.iter().all(u8::is_ascii_whitespace) {
        ApproveImportOrderRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid approval body: {}", e)))?
    };

    let order = state
        .db
        .import_orders()
        .approve(id, req, &user.actor())
        .await?;
    Ok(ApiResponse::ok("Import order approved", order))
}

/// DELETE /import-orders/{id} - pending orders only.
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<ImportOrder> {
    user.require(Role::Admin)?;
    let order = state.db.import_orders().delete(id, &user.actor()).await?;
    Ok(ApiResponse::ok("Import order deleted", order))
}
