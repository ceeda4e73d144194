//! Intent/capture payment adapter (Stripe dialect).
//!
//! `create` opens a PaymentIntent carrying the order id as metadata and
//! returns the client secret; settlement is implicit and arrives through the
//! signed webhook. Webhook signatures are `t=<unix>,v1=<hmac>` over
//! `"{t}.{payload}"` with HMAC-SHA256 and a shared secret held out-of-band.

use async_trait::async_trait;
use beatstore_core::types::DbId;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::gateway::{
    CaptureOutcome, PaymentError, PaymentGateway, PaymentIntent, WebhookHeaders,
};

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Header carrying the webhook signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age of a signed webhook, in seconds. Blocks replay of
/// captured deliveries.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// The intent-based payment gateway.
pub struct StripeGateway {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(secret_key: String, webhook_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key,
            webhook_secret,
        }
    }

    /// Point the gateway at a different API host (sandbox, test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct IntentStatusResponse {
    status: String,
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create(
        &self,
        amount_cents: i64,
        order_id: DbId,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount_cents.to_string()),
                ("currency", "usd".to_string()),
                ("automatic_payment_methods[enabled]", "true".to_string()),
                ("metadata[order_id]", order_id.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "payment intent creation failed with {status}: {body}"
            )));
        }

        let intent: IntentResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Payload(e.to_string()))?;

        Ok(PaymentIntent {
            provider_ref: intent.id,
            client_secret: Some(intent.client_secret),
        })
    }

    async fn capture(&self, provider_ref: &str) -> Result<CaptureOutcome, PaymentError> {
        // Settlement is provider-side for this flow; capture only reports
        // the intent's current state.
        let response = self
            .http
            .get(format!(
                "{}/v1/payment_intents/{provider_ref}",
                self.base_url
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PaymentError::Provider(format!(
                "payment intent lookup failed with {status}"
            )));
        }

        let intent: IntentStatusResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Payload(e.to_string()))?;

        Ok(CaptureOutcome {
            completed: intent.status == "succeeded",
            raw_status: intent.status,
        })
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> Result<bool, PaymentError> {
        let Some(header) = headers.get(SIGNATURE_HEADER) else {
            return Ok(false);
        };
        let now = chrono::Utc::now().timestamp();
        Ok(verify_signature(
            &self.webhook_secret,
            payload,
            header,
            SIGNATURE_TOLERANCE_SECS,
            now,
        ))
    }
}

// ---------------------------------------------------------------------------
// Signature verification
// ---------------------------------------------------------------------------

/// Verify a `t=...,v1=...` signature header against `payload`.
///
/// Accepts the delivery when any `v1` candidate matches the HMAC-SHA256 of
/// `"{t}.{payload}"` (constant-time compare) and the timestamp is within
/// `tolerance_secs` of `now_unix`.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_secs: i64,
    now_unix: i64,
) -> bool {
    let Some((timestamp, candidates)) = parse_signature_header(header) else {
        return false;
    };

    if (now_unix - timestamp).abs() > tolerance_secs {
        return false;
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in candidates {
        let Some(bytes) = hex_decode(&candidate) else {
            continue;
        };
        // verify_slice is constant-time; clone because verification consumes
        // the MAC state.
        if mac.clone().verify_slice(&bytes).is_ok() {
            return true;
        }
    }
    false
}

/// Compute the signature header a provider would send. Shared with tests and
/// useful against sandbox environments.
pub fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let digest = mac.finalize().into_bytes();

    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest {
        hex.push_str(&format!("{b:02x}"));
    }
    format!("t={timestamp},v1={hex}")
}

/// Split the signature header into its timestamp and `v1` candidates.
fn parse_signature_header(header: &str) -> Option<(i64, Vec<String>)> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => candidates.push(value.to_string()),
            // Future scheme versions are ignored, per the provider contract.
            _ => {}
        }
    }

    match (timestamp, candidates.is_empty()) {
        (Some(t), false) => Some((t, candidates)),
        _ => None,
    }
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Event parsing
// ---------------------------------------------------------------------------

/// A webhook event reduced to what fulfillment needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeEvent {
    /// Provider event type, e.g. `payment_intent.succeeded`.
    pub event_type: String,
    /// The order id carried in the intent's metadata, when present.
    pub order_id: Option<DbId>,
}

/// Event type signalling a settled payment.
pub const EVENT_PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Event type signalling a failed payment.
pub const EVENT_PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// Parse a verified webhook payload.
pub fn parse_event(payload: &[u8]) -> Result<StripeEvent, PaymentError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| PaymentError::Payload(e.to_string()))?;

    let event_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| PaymentError::Payload("event has no type".to_string()))?
        .to_string();

    let order_id = value
        .pointer("/data/object/metadata/order_id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<DbId>().ok());

    Ok(StripeEvent {
        event_type,
        order_id,
    })
}
