//! Route definitions for the `/checkout` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::checkout;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// POST /checkout                  -> open a checkout
/// POST /checkout/paypal-capture   -> capture + fulfill the redirect flow
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::checkout))
        .route("/checkout/paypal-capture", post(checkout::paypal_capture))
}
