//! The payment provider capability.

use std::collections::HashMap;

use async_trait::async_trait;
use beatstore_core::types::DbId;

/// Error type for provider calls. Messages may contain provider responses;
/// the API layer logs them and answers clients with a sanitized 500.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("Provider transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Provider rejected the request: {0}")]
    Provider(String),

    /// The provider answered 2xx but the payload was not understood.
    #[error("Malformed provider payload: {0}")]
    Payload(String),
}

/// A provider-side payment object opened for one order.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// The provider's identifier, persisted onto the order.
    pub provider_ref: String,
    /// Client-side completion secret; present for the intent-based flow only.
    pub client_secret: Option<String>,
}

/// Result of an explicit capture call.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// `true` iff the provider reports the payment as completed. Anything
    /// else must not be treated as paid.
    pub completed: bool,
    /// The provider's own status word, for logging.
    pub raw_status: String,
}

/// Lowercased header name to value, as handed to webhook verification.
pub type WebhookHeaders = HashMap<String, String>;

/// Capability interface every payment back-end provides.
///
/// Implementations are interchangeable from the checkout orchestrator's
/// perspective; it dispatches on the buyer's chosen method and only needs
/// [`create`](PaymentGateway::create).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a provider-side payment object for `amount_cents`, tagged with
    /// the order id so asynchronous confirmations can find their order.
    async fn create(&self, amount_cents: i64, order_id: DbId)
        -> Result<PaymentIntent, PaymentError>;

    /// Settle a previously created payment object. For intent-based
    /// providers this only reports the current state; settlement happens on
    /// the provider's side and arrives via webhook.
    async fn capture(&self, provider_ref: &str) -> Result<CaptureOutcome, PaymentError>;

    /// Check an inbound webhook delivery's authenticity. `Ok(false)` means
    /// the signature did not verify; the event must be discarded.
    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> Result<bool, PaymentError>;
}
