//! Reports: sales ledger, stock totals, expiry alerts.
//!
//! Handlers load state through lacto-db and hand it to the pure aggregation
//! functions in lacto-core; no report ever mutates anything.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use lacto_core::reporting::{expiry_alerts, total_stock_by_product};
use lacto_core::{ExpiryAlert, Permission, SaleRecord, StockTotal, DEFAULT_ALERT_WINDOW_DAYS};

#[derive(Debug, Deserialize)]
pub struct ExpiryAlertParams {
    /// Days ahead to warn about; defaults to one week.
    pub window_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ExpiryAlertResponse {
    pub as_of: NaiveDate,
    pub window_days: i64,
    pub alerts: Vec<ExpiryAlert>,
}

/// GET /api/sales
///
/// The full ledger, most recent sale first.
async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SaleRecord>>, ApiError> {
    user.require(Permission::ViewReports)?;

    let sales = state.db.sales().list_all().await?;
    Ok(Json(sales))
}

/// GET /api/reports/stock-totals
///
/// Total units on hand per catalog product, across every area.
async fn stock_totals(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<BTreeMap<String, StockTotal>>, ApiError> {
    user.require(Permission::ViewReports)?;

    let instances = state.db.stock().list_all().await?;
    Ok(Json(total_stock_by_product(&instances)))
}

/// GET /api/reports/expiry-alerts?window_days=7
///
/// Expired and soon-to-expire batches, most urgent first.
async fn expiry_alert_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ExpiryAlertParams>,
) -> Result<Json<ExpiryAlertResponse>, ApiError> {
    user.require(Permission::ViewReports)?;

    let window_days = params.window_days.unwrap_or(DEFAULT_ALERT_WINDOW_DAYS);
    if !(0..=365).contains(&window_days) {
        return Err(ApiError::validation(
            "window_days must be between 0 and 365",
        ));
    }

    let as_of = Utc::now().date_naive();
    let areas = state.db.areas().list_all_with_stock().await?;

    Ok(Json(ExpiryAlertResponse {
        as_of,
        window_days,
        alerts: expiry_alerts(&areas, as_of, window_days),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list_sales))
        .route("/api/reports/stock-totals", get(stock_totals))
        .route("/api/reports/expiry-alerts", get(expiry_alert_report))
}
