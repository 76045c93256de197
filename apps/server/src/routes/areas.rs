//! Storage area CRUD.
//!
//! Viewing is open to every role; creating, editing and deleting areas
//! requires `manage_areas`. Deleting an area that still holds stock is
//! rejected by the repository with an in-use error.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use lacto_core::validation::normalize_code;
use lacto_core::{Area, Permission, StockInstance, StorageType};

#[derive(Debug, Deserialize)]
pub struct CreateAreaRequest {
    pub id: String,
    pub name: String,
    pub storage_type: StorageType,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAreaRequest {
    pub name: String,
    pub storage_type: StorageType,
}

/// An area together with the batches it holds, soonest expiry first.
#[derive(Debug, Serialize)]
pub struct AreaDetailResponse {
    pub area: Area,
    pub stock: Vec<StockInstance>,
}

/// GET /api/areas
async fn list_areas(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Area>>, ApiError> {
    user.require(Permission::ViewWarehouse)?;

    let areas = state.db.areas().list_all().await?;
    Ok(Json(areas))
}

/// POST /api/areas
async fn create_area(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateAreaRequest>,
) -> Result<(StatusCode, Json<Area>), ApiError> {
    user.require(Permission::ManageAreas)?;

    let area = state
        .db
        .areas()
        .insert(&req.id, &req.name, req.storage_type)
        .await?;

    info!(area_id = %area.id, username = %user.username, "Area created");

    Ok((StatusCode::CREATED, Json(area)))
}

/// GET /api/areas/{id}
async fn get_area(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AreaDetailResponse>, ApiError> {
    user.require(Permission::ViewWarehouse)?;

    let id = normalize_code(&id);
    let area = state
        .db
        .areas()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Area", &id))?;

    let stock = state.db.stock().list_for_area(&id).await?;

    Ok(Json(AreaDetailResponse { area, stock }))
}

/// PUT /api/areas/{id}
async fn update_area(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateAreaRequest>,
) -> Result<Json<Area>, ApiError> {
    user.require(Permission::ManageAreas)?;

    let id = normalize_code(&id);
    state
        .db
        .areas()
        .update(&id, &req.name, req.storage_type)
        .await?;

    info!(area_id = %id, username = %user.username, "Area updated");

    let area = state
        .db
        .areas()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Area", &id))?;

    Ok(Json(area))
}

/// DELETE /api/areas/{id}
async fn delete_area(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageAreas)?;

    let id = normalize_code(&id);
    state.db.areas().delete(&id).await?;

    info!(area_id = %id, username = %user.username, "Area deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/areas", get(list_areas).post(create_area))
        .route(
            "/api/areas/{id}",
            get(get_area).put(update_area).delete(delete_area),
        )
}
