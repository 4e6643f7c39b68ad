//! Customer directory endpoints.

use axum::extract::State;
use steel_core::customer::{Customer, CustomerQuery, NewCustomer, UpdateCustomer};
use steel_core::Paginated;

use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::response::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /customers?search=&page=&limit=
#[tracing::instrument(skip(state, _user))]
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<CustomerQuery>,
) -> ApiResult<Paginated<Customer>> {
    let page = state.db.customers().search(&query).await?;
    Ok(ApiResponse::ok("Customers retrieved", page))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Customer> {
    let customer = state
        .db
        .customers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))?;
    Ok(ApiResponse::ok("Customer retrieved", customer))
}

/// GET /customers/phone/{phone}
#[tracing::instrument(skip(state, _user))]
pub async fn get_by_phone(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(phone): Path<String>,
) -> ApiResult<Customer> {
    let customer = state
        .db
        .customers()
        .get_by_phone(&phone)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", &phone))?;
    Ok(ApiResponse::ok("Customer retrieved", customer))
}

/// POST /customers
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewCustomer>,
) -> ApiResult<Customer> {
    user.require(Role::Manager)?;
    let customer = state.db.customers().create(&req).await?;
    Ok(ApiResponse::created("Customer created", customer))
}

/// PUT /customers/{id}
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCustomer>,
) -> ApiResult<Customer> {
    user.require(Role::Manager)?;
    let customer = state.db.customers().update(id, &req).await?;
    Ok(ApiResponse::ok("Customer updated", customer))
}

/// DELETE /customers/{id} - soft delete.
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require(Role::Manager)?;
    state.db.customers().deactivate(id).await?;
    Ok(ApiResponse::message("Customer deactivated"))
}
