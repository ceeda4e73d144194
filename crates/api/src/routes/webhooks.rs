//! Route definitions for the `/webhooks` callbacks.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// POST /stripe   -> intent provider events (signature-verified)
/// POST /paypal   -> redirect provider events (remote-verified)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stripe", post(webhooks::stripe_webhook))
        .route("/paypal", post(webhooks::paypal_webhook))
}
