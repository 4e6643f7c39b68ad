//! Payment ledger endpoints.
//!
//! `POST /invoice-payments/{id}` takes the invoice id; the other verbs on
//! the same path address a payment.

use axum::extract::State;
use steel_core::payment::{CorrectPaymentRequest, InvoicePayment, RegisterPaymentRequest};

use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::response::{ApiResponse, ApiResult};
use crate::AppState;

/// POST /invoice-payments/{invoice_id}
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
    Json(req): Json<RegisterPaymentRequest>,
) -> ApiResult<InvoicePayment> {
    user.require(Role::Manager)?;
    let payment = state
        .db
        .payments()
        .register(invoice_id, req, &user.actor())
        .await?;
    Ok(ApiResponse::created("Payment registered", payment))
}

/// GET /invoice-payments/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<InvoicePayment> {
    let payment = state
        .db
        .payments()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("InvoicePayment", id))?;
    Ok(ApiResponse::ok("Payment retrieved", payment))
}

/// PUT /invoice-payments/{id}
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn correct(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<CorrectPaymentRequest>,
) -> ApiResult<InvoicePayment> {
    user.require(Role::Manager)?;
    let payment = state.db.payments().correct(id, req, &user.actor()).await?;
    Ok(ApiResponse::ok("Payment corrected", payment))
}

/// DELETE /invoice-payments/{id}
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require(Role::Manager)?;
    state.db.payments().delete(id, &user.actor()).await?;
    Ok(ApiResponse::message("Payment deleted"))
}
