//! Invoice endpoints.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use steel_core::invoice::{
    CreateInvoiceRequest, Invoice, InvoiceFilter, InvoiceSummary, UpdateInvoiceRequest,
};
use steel_core::Paginated;
use tracing::info;

use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::response::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /invoices?search=&status=&payment_status=&customer_id=&page=&limit=
#[tracing::instrument(skip(state, _user))]
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<Paginated<Invoice>> {
    let page = state.db.invoices().list(&filter).await?;
    Ok(ApiResponse::ok("Invoices retrieved", page))
}

/// GET /invoices/summary
#[tracing::instrument(skip(state, _user))]
pub async fn summary(State(state): State<AppState>, _user: AuthUser) -> ApiResult<InvoiceSummary> {
    let summary = state.db.invoices().summary().await?;
    Ok(ApiResponse::ok("Invoice summary retrieved", summary))
}

/// GET /invoices/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Invoice> {
    let invoice = find(&state, id).await?;
    Ok(ApiResponse::ok("Invoice retrieved", invoice))
}

/// GET /invoices/code/{code}
#[tracing::instrument(skip(state, _user))]
pub async fn get_by_code(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<Invoice> {
    let invoice = state
        .db
        .invoices()
        .get_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", &code))?;
    Ok(ApiResponse::ok("Invoice retrieved", invoice))
}

/// POST /invoices
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateInvoiceRequest>,
) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    let invoice = state.db.invoices().create(req, &user.actor()).await?;
    Ok(ApiResponse::created("Invoice created", invoice))
}

/// PUT /invoices/{id}
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateInvoiceRequest>,
) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    let invoice = state.db.invoices().update(id, req, &user.actor()).await?;
    Ok(ApiResponse::ok("Invoice updated", invoice))
}

/// DELETE /invoices/{id} - soft cancel.
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Invoice> {
    user.require(Role::Manager)?;
    let invoice = state.db.invoices().delete(id, &user.actor()).await?;
    Ok(ApiResponse::ok("Invoice cancelled", invoice))
}

/// GET /invoices/{id}/print - rendered document, not an envelope.
#[tracing::instrument(skip(state, _user))]
pub async fn print(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let invoice = find(&state, id).await?;
    let bytes = state.renderer.render_invoice(&invoice).map_err(|e| {
        tracing::error!(error = %e, invoice_id = id, "Rendering failed");
        ApiError::internal("Failed to render invoice")
    })?;

    info!(invoice_id = id, bytes = bytes.len(), "Invoice rendered");
    Ok(([(header::CONTENT_TYPE, state.renderer.content_type())], bytes).into_response())
}

async fn find(state: &AppState, id: i64) -> Result<Invoice, ApiError> {
    state
        .db
        .invoices()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", id))
}
