//! Public catalog handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use beatstore_core::error::CoreError;
use beatstore_core::types::DbId;
use beatstore_db::models::beat::{BeatListQuery, BeatSummary};
use beatstore_db::repositories::BeatRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::throttle::ApiRate;
use crate::state::AppState;

/// GET /api/v1/beats
///
/// Active beats, newest first. `q` matches title substrings or exact tags,
/// `genre` matches the genre, both case-insensitively. The projection never
/// includes blob store keys.
pub async fn list(
    _rate: ApiRate,
    State(state): State<AppState>,
    Query(query): Query<BeatListQuery>,
) -> AppResult<Json<Vec<BeatSummary>>> {
    let beats = BeatRepo::list_active(
        &state.pool,
        query.q.as_deref().filter(|q| !q.is_empty()),
        query.genre.as_deref().filter(|g| !g.is_empty()),
    )
    .await?;
    Ok(Json(beats))
}

/// POST /api/v1/beats/{id}/play
///
/// Bump the play counter. Unthrottled and unauthenticated; the counter is
/// advisory.
pub async fn play(
    State(state): State<AppState>,
    Path(beat_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    if !BeatRepo::increment_plays(&state.pool, beat_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Beat",
            id: beat_id,
        }));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}
