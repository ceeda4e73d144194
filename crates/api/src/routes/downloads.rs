//! Route definitions for the `/downloads` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::downloads;
use crate::state::AppState;

/// Routes mounted at `/downloads`.
///
/// ```text
/// GET /{token}   -> redeem a download token
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{token}", get(downloads::redeem))
}
