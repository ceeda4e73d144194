//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /session  -> login
/// DELETE /session  -> logout
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/session", post(auth::login).delete(auth::logout))
}
