//! Liveness endpoint, mounted at the root (not under `/api/v1`).

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Routes mounted at `/`.
pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(health))
}

/// GET /healthz
///
/// Answers `{"status":"ok"}` when the database responds.
async fn health(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    beatstore_db::health_check(&state.pool)
        .await
        .map_err(AppError::Database)?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
