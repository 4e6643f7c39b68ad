//! Catalog endpoints.

use axum::extract::State;
use steel_core::catalog::{
    NewProduct, NewVariant, Product, ProductQuery, ProductVariant, UpdateProduct, UpdateVariant,
};
use steel_core::inventory::InventoryMovement;
use steel_core::Paginated;

use crate::auth::{AuthUser, Role};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::response::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /products?search=&page=&limit=
#[tracing::instrument(skip(state, _user))]
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Paginated<Product>> {
    let page = state.db.products().list(&query).await?;
    Ok(ApiResponse::ok("Products retrieved", page))
}

/// GET /products/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(ApiResponse::ok("Product retrieved", product))
}

/// POST /products - product plus variants in one transaction.
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewProduct>,
) -> ApiResult<Product> {
    user.require(Role::Manager)?;
    let product = state.db.products().create(&req).await?;
    Ok(ApiResponse::created("Product created", product))
}

/// PUT /products/{id}
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProduct>,
) -> ApiResult<Product> {
    user.require(Role::Manager)?;
    let product = state.db.products().update(id, &req).await?;
    Ok(ApiResponse::ok("Product updated", product))
}

/// DELETE /products/{id} - soft delete, variants included.
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require(Role::Manager)?;
    state.db.products().deactivate(id).await?;
    Ok(ApiResponse::message("Product deactivated"))
}

/// POST /products/{id}/variants
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn add_variant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<NewVariant>,
) -> ApiResult<ProductVariant> {
    user.require(Role::Manager)?;
    let variant = state.db.products().add_variant(id, &req).await?;
    Ok(ApiResponse::created("Variant created", variant))
}

/// GET /products/variants/{id}
#[tracing::instrument(skip(state, _user))]
pub async fn get_variant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<ProductVariant> {
    let variant = state
        .db
        .products()
        .get_variant(id)
        .await?
        .ok_or_else(|| ApiError::not_found("ProductVariant", id))?;
    Ok(ApiResponse::ok("Variant retrieved", variant))
}

/// PUT /products/variants/{id} - stock is not editable here.
#[tracing::instrument(skip(state, user, req), fields(user_id = user.user_id))]
pub async fn update_variant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateVariant>,
) -> ApiResult<ProductVariant> {
    user.require(Role::Manager)?;
    let variant = state.db.products().update_variant(id, &req).await?;
    Ok(ApiResponse::ok("Variant updated", variant))
}

/// DELETE /products/variants/{id} - soft delete.
#[tracing::instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn delete_variant(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    user.require(Role::Manager)?;
    state.db.products().deactivate_variant(id).await?;
    Ok(ApiResponse::message("Variant deactivated"))
}

/// GET /variants/{id}/movements - newest first.
#[tracing::instrument(skip(state, _user))]
pub async fn movements(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<InventoryMovement>> {
    if state.db.products().get_variant(id).await?.is_none() {
        return Err(ApiError::not_found("ProductVariant", id));
    }
    let movements = state.db.inventory().list_by_variant(id).await?;
    Ok(ApiResponse::ok("Inventory movements retrieved", movements))
}
