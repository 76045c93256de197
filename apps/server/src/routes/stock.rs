//! Stock batch operations inside areas.
//!
//! ## Request Flow (sell)
//! ```text
//! POST /api/areas/COLD-01/stock/{instance}/sell  {"quantity": 3, "destination": "Mercado Azul"}
//!      │
//!      ├── AuthUser extractor validates the Bearer token
//!      ├── require(record_sales)
//!      │
//!      ▼
//! StockRepository::sell - one transaction:
//!      check area ownership → check quantity → decrement → append ledger
//!      │
//!      ▼
//! 200 Json<SaleRecord>   (or 404/409/400 with a typed code)
//! ```
//!
//! The acting username is snapshotted from the token onto the sale record;
//! it never comes from the request body.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use lacto_core::validation::{normalize_code, parse_expiry_date};
use lacto_core::{Area, CoreError, Permission, SaleRecord, StockInstance};

#[derive(Debug, Deserialize)]
pub struct AddStockRequest {
    pub product_id: String,
    pub quantity: i64,
    /// Calendar date, YYYY-MM-DD.
    pub expiry_date: String,
    pub lot: String,
}

#[derive(Debug, Deserialize)]
pub struct SellStockRequest {
    pub quantity: i64,
    pub destination: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    pub quantity: i64,
    /// Calendar date, YYYY-MM-DD.
    pub expiry_date: String,
    pub lot: String,
}

/// An area and the batches it holds, soonest expiry first.
#[derive(Debug, Serialize)]
pub struct AreaStockResponse {
    pub area: Area,
    pub stock: Vec<StockInstance>,
}

/// GET /api/areas/{id}/stock
///
/// Read-only listing of one area's batches, for external consumers.
async fn list_area_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(area_id): Path<String>,
) -> Result<Json<AreaStockResponse>, ApiError> {
    user.require(Permission::ViewWarehouse)?;

    let area_id = normalize_code(&area_id);
    let area = state
        .db
        .areas()
        .get_by_id(&area_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Area", &area_id))?;

    let stock = state.db.stock().list_for_area(&area_id).await?;

    Ok(Json(AreaStockResponse { area, stock }))
}

/// GET /api/stock
///
/// Read-only listing of every area's batches, for external consumers.
async fn list_all_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AreaStockResponse>>, ApiError> {
    user.require(Permission::ViewReports)?;

    let grouped = state.db.areas().list_all_with_stock().await?;

    Ok(Json(
        grouped
            .into_iter()
            .map(|(area, stock)| AreaStockResponse { area, stock })
            .collect(),
    ))
}

/// POST /api/areas/{id}/stock
///
/// Adds a batch, merging into an existing one when the (product, lot) pair
/// already exists in the area.
async fn add_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(area_id): Path<String>,
    Json(req): Json<AddStockRequest>,
) -> Result<(StatusCode, Json<StockInstance>), ApiError> {
    user.require(Permission::ManageStock)?;

    let area_id = normalize_code(&area_id);
    let product_id = normalize_code(&req.product_id);
    let expiry_date = parse_expiry_date(&req.expiry_date).map_err(CoreError::from)?;

    let instance = state
        .db
        .stock()
        .add_or_merge(&area_id, &product_id, req.quantity, expiry_date, &req.lot)
        .await?;

    info!(
        area_id = %area_id,
        instance_id = %instance.id,
        quantity = instance.quantity,
        username = %user.username,
        "Stock added"
    );

    Ok((StatusCode::CREATED, Json(instance)))
}

/// POST /api/areas/{id}/stock/{iid}/sell
async fn sell_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path((area_id, instance_id)): Path<(String, String)>,
    Json(req): Json<SellStockRequest>,
) -> Result<Json<SaleRecord>, ApiError> {
    user.require(Permission::RecordSales)?;

    let area_id = normalize_code(&area_id);
    let record = state
        .db
        .stock()
        .sell(
            &area_id,
            &instance_id,
            req.quantity,
            &req.destination,
            &user.username,
        )
        .await?;

    info!(
        sale_id = %record.id,
        area_id = %area_id,
        quantity = record.quantity_sold,
        username = %user.username,
        "Sale recorded"
    );

    Ok(Json(record))
}

/// PUT /api/areas/{id}/stock/{iid}
async fn update_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path((area_id, instance_id)): Path<(String, String)>,
    Json(req): Json<UpdateStockRequest>,
) -> Result<Json<StockInstance>, ApiError> {
    user.require(Permission::ManageStock)?;

    let area_id = normalize_code(&area_id);
    let expiry_date = parse_expiry_date(&req.expiry_date).map_err(CoreError::from)?;

    let instance = state
        .db
        .stock()
        .update_instance(&area_id, &instance_id, req.quantity, expiry_date, &req.lot)
        .await?;

    info!(
        area_id = %area_id,
        instance_id = %instance.id,
        username = %user.username,
        "Stock updated"
    );

    Ok(Json(instance))
}

/// DELETE /api/areas/{id}/stock/{iid}
async fn delete_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path((area_id, instance_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageStock)?;

    let area_id = normalize_code(&area_id);
    state
        .db
        .stock()
        .delete_instance(&area_id, &instance_id)
        .await?;

    info!(
        area_id = %area_id,
        instance_id = %instance_id,
        username = %user.username,
        "Stock deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stock", get(list_all_stock))
        .route("/api/areas/{id}/stock", get(list_area_stock).post(add_stock))
        .route(
            "/api/areas/{id}/stock/{iid}",
            axum::routing::put(update_stock).delete(delete_stock),
        )
        .route("/api/areas/{id}/stock/{iid}/sell", post(sell_stock))
}
