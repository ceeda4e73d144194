//! Admin handlers for catalog management and order inspection.
//!
//! All endpoints require the session cookie via [`RequireAdmin`] and answer
//! in the `{ "data": ... }` envelope.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use beatstore_core::error::CoreError;
use beatstore_core::types::DbId;
use beatstore_db::models::beat::{Beat, CreateBeat};
use beatstore_db::models::order::{Order, OrderItemDetail};
use beatstore_db::repositories::{BeatRepo, OrderRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::admin::RequireAdmin;
use crate::middleware::throttle::ApiRate;
use crate::response::DataResponse;
use crate::state::AppState;

/// Orders shown on the admin dashboard.
const RECENT_ORDER_LIMIT: i64 = 100;

// ---------------------------------------------------------------------------
// Beats
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/beats
///
/// Every beat, active or not, including object keys.
pub async fn list_beats(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let beats = BeatRepo::list_all(&state.pool).await?;
    Ok(Json(DataResponse { data: beats }))
}

/// POST /api/v1/admin/beats
///
/// Create a beat. The slug is derived server-side from the title.
pub async fn create_beat(
    _admin: RequireAdmin,
    _rate: ApiRate,
    State(state): State<AppState>,
    Json(input): Json<CreateBeat>,
) -> AppResult<impl IntoResponse> {
    validate_beat(&input)?;

    let beat = BeatRepo::create(&state.pool, &input).await?;

    tracing::info!(beat_id = beat.id, slug = %beat.slug, "Beat created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: beat })))
}

/// DELETE /api/v1/admin/beats/{id}
///
/// Soft-delete: the beat leaves the catalog but stays referenced by order
/// history.
pub async fn deactivate_beat(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(beat_id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !BeatRepo::deactivate(&state.pool, beat_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Beat",
            id: beat_id,
        }));
    }

    tracing::info!(beat_id, "Beat deactivated");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_beat(input: &CreateBeat) -> Result<(), AppError> {
    let required = [
        ("title", &input.title),
        ("musical_key", &input.musical_key),
        ("genre", &input.genre),
        ("mp3_key", &input.mp3_key),
        ("wav_key", &input.wav_key),
    ];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(AppError::Core(CoreError::Validation(format!(
                "{name} must not be empty"
            ))));
        }
    }
    if input.bpm <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "bpm must be positive".to_string(),
        )));
    }
    if input.price_cents < 0 || input.exclusive_price_cents.is_some_and(|p| p < 0) {
        return Err(AppError::Core(CoreError::Validation(
            "Prices must not be negative".to_string(),
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// One order with its line items, as shown to the admin.
#[derive(Debug, Serialize)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// GET /api/v1/admin/orders
///
/// The most recent orders, newest first, with their line items.
pub async fn list_orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let orders = OrderRepo::list_recent(&state.pool, RECENT_ORDER_LIMIT).await?;
    let ids: Vec<DbId> = orders.iter().map(|o| o.id).collect();

    let mut items_by_order: HashMap<DbId, Vec<OrderItemDetail>> = HashMap::new();
    for item in OrderRepo::items_for_orders(&state.pool, &ids).await? {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let data: Vec<AdminOrder> = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            AdminOrder { order, items }
        })
        .collect();

    Ok(Json(DataResponse { data }))
}
