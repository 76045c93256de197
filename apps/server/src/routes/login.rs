//! Credential verification and token issuing.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;
use lacto_core::{Permission, Role};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent /api requests.
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    /// The role's permission set, so clients can gate their UI.
    pub permissions: Vec<Permission>,
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .db
        .users()
        .verify_credentials(&req.username, &req.password)
        .await?;

    let Some(user) = user else {
        warn!(username = %req.username, "Failed login attempt");
        return Err(ApiError::unauthorized("Invalid username or password"));
    };

    let token = state.jwt.generate_token(&user)?;

    info!(username = %user.username, role = ?user.role, "Login successful");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        display_name: user.display_name,
        role: user.role,
        permissions: user.role.permissions().to_vec(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}
