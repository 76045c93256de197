//! Catalog product CRUD.
//!
//! Viewing the catalog comes with warehouse access (operators pick from it
//! when adding stock); changing it requires `manage_catalog`. Deleting a
//! product that batches still reference is rejected with an in-use error.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use lacto_core::validation::normalize_code;
use lacto_core::{CatalogProduct, Permission};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
}

/// GET /api/catalog
async fn list_catalog(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<CatalogProduct>>, ApiError> {
    user.require(Permission::ViewWarehouse)?;

    let products = state.db.catalog().list().await?;
    Ok(Json(products))
}

/// POST /api/catalog
async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<CatalogProduct>), ApiError> {
    user.require(Permission::ManageCatalog)?;

    let product = state.db.catalog().insert(&req.id, &req.name).await?;

    info!(product_id = %product.id, username = %user.username, "Catalog product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/catalog/{id}
async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>, ApiError> {
    user.require(Permission::ViewWarehouse)?;

    let id = normalize_code(&id);
    let product = state
        .db
        .catalog()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Catalog product", &id))?;

    Ok(Json(product))
}

/// PUT /api/catalog/{id}
async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<CatalogProduct>, ApiError> {
    user.require(Permission::ManageCatalog)?;

    let id = normalize_code(&id);
    state.db.catalog().update_name(&id, &req.name).await?;

    info!(product_id = %id, username = %user.username, "Catalog product renamed");

    let product = state
        .db
        .catalog()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Catalog product", &id))?;

    Ok(Json(product))
}

/// DELETE /api/catalog/{id}
async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageCatalog)?;

    let id = normalize_code(&id);
    state.db.catalog().delete(&id).await?;

    info!(product_id = %id, username = %user.username, "Catalog product deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog", get(list_catalog).post(create_product))
        .route(
            "/api/catalog/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}
