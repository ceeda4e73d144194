//! Route definitions for the `/admin` surface (session cookie required).

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /beats        -> list all beats
/// POST   /beats        -> create a beat
/// DELETE /beats/{id}   -> deactivate a beat
/// GET    /orders       -> recent orders with items
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/beats", get(admin::list_beats).post(admin::create_beat))
        .route("/beats/{id}", delete(admin::deactivate_beat))
        .route("/orders", get(admin::list_orders))
}
