//! Route definitions for the public `/beats` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::beats;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// GET  /beats             -> catalog listing (?q, ?genre)
/// POST /beats/{id}/play   -> play counter
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/beats", get(beats::list))
        .route("/beats/{id}/play", post(beats::play))
}
