use std::sync::Arc;

use beatstore_notify::PurchaseNotifier;
use beatstore_payments::PaymentGateway;
use beatstore_storage::BlobStore;

use crate::config::ServerConfig;
use crate::middleware::throttle::Guard;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). The payment
/// gateways, blob store, and notifier are trait objects so tests can swap in
/// doubles without touching the router.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: beatstore_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Per-IP rate buckets and the login lockout counter.
    pub guard: Arc<Guard>,
    /// Intent-based payment gateway (card networks).
    pub stripe: Arc<dyn PaymentGateway>,
    /// Redirect-capture payment gateway.
    pub paypal: Arc<dyn PaymentGateway>,
    /// Blob store minting signed download URLs.
    pub blobs: Arc<dyn BlobStore>,
    /// Confirmation email sender; `None` when SMTP is not configured.
    pub notifier: Option<Arc<dyn PurchaseNotifier>>,
}
