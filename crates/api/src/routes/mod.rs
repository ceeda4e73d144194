pub mod admin;
pub mod auth;
pub mod beats;
pub mod checkout;
pub mod downloads;
pub mod health;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/session                 login (POST), logout (DELETE)
///
/// /beats                        public catalog (GET)
/// /beats/{id}/play              play counter (POST)
///
/// /checkout                     open a checkout (POST)
/// /checkout/paypal-capture      explicit capture + fulfillment (POST)
///
/// /webhooks/stripe              signed provider events (POST)
/// /webhooks/paypal              remote-verified provider events (POST)
///
/// /downloads/{token}            redeem a download token (GET)
///
/// /admin/beats                  list, create (session required)
/// /admin/beats/{id}             deactivate (DELETE)
/// /admin/orders                 recent orders with items (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Admin session (login, logout).
        .nest("/auth", auth::router())
        // Public catalog.
        .merge(beats::router())
        // Checkout orchestration and explicit capture.
        .merge(checkout::router())
        // Payment provider callbacks.
        .nest("/webhooks", webhooks::router())
        // Download token redemption.
        .nest("/downloads", downloads::router())
        // Catalog management and order inspection.
        .nest("/admin", admin::router())
}
