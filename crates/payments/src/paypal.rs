//! Redirect-capture payment adapter (PayPal dialect).
//!
//! `create` opens a provider order the buyer authorizes out-of-band; the
//! storefront then calls `capture` and must see a `COMPLETED` status before
//! treating the purchase as paid. Webhook signatures cannot be checked
//! locally for this dialect; verification is a call back to the provider.

use async_trait::async_trait;
use beatstore_core::types::DbId;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{
    CaptureOutcome, PaymentError, PaymentGateway, PaymentIntent, WebhookHeaders,
};

const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
const LIVE_BASE_URL: &str = "https://api-m.paypal.com";

/// Transmission headers required by remote webhook verification, in the
/// order the verification endpoint names them.
const TRANSMISSION_HEADERS: [&str; 5] = [
    "paypal-auth-algo",
    "paypal-cert-url",
    "paypal-transmission-id",
    "paypal-transmission-sig",
    "paypal-transmission-time",
];

/// The redirect-capture payment gateway.
pub struct PayPalGateway {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    webhook_id: String,
}

impl PayPalGateway {
    pub fn new(client_id: String, client_secret: String, webhook_id: String, live: bool) -> Self {
        let base_url = if live { LIVE_BASE_URL } else { SANDBOX_BASE_URL };
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.to_string(),
            client_id,
            client_secret,
            webhook_id,
        }
    }

    /// Point the gateway at a different API host (test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Obtain a client-credentials access token. Tokens are short-lived and
    /// cheap; one is fetched per outbound call rather than cached.
    async fn access_token(&self) -> Result<String, PaymentError> {
        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PaymentError::Provider(format!(
                "token request failed with {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Payload(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    verification_status: String,
}

#[async_trait]
impl PaymentGateway for PayPalGateway {
    async fn create(
        &self,
        amount_cents: i64,
        order_id: DbId,
    ) -> Result<PaymentIntent, PaymentError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(token)
            .json(&json!({
                "intent": "CAPTURE",
                "purchase_units": [{
                    "amount": {
                        "currency_code": "USD",
                        "value": format_amount(amount_cents),
                    },
                    "custom_id": order_id.to_string(),
                }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider(format!(
                "order creation failed with {status}: {body}"
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Payload(e.to_string()))?;

        Ok(PaymentIntent {
            provider_ref: order.id,
            client_secret: None,
        })
    }

    async fn capture(&self, provider_ref: &str) -> Result<CaptureOutcome, PaymentError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!(
                "{}/v2/checkout/orders/{provider_ref}/capture",
                self.base_url
            ))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PaymentError::Provider(format!(
                "capture failed with {status}"
            )));
        }

        let capture: CaptureResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Payload(e.to_string()))?;

        Ok(CaptureOutcome {
            completed: capture.status == "COMPLETED",
            raw_status: capture.status,
        })
    }

    async fn verify_webhook(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
    ) -> Result<bool, PaymentError> {
        let Some(body) = build_verification_body(headers, &self.webhook_id, payload) else {
            // Missing transmission headers or an unparseable event can never
            // verify; not a provider error.
            return Ok(false);
        };

        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!(
                "{}/v1/notifications/verify-webhook-signature",
                self.base_url
            ))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(PaymentError::Provider(format!(
                "webhook verification failed with {status}"
            )));
        }

        let verification: VerificationResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Payload(e.to_string()))?;
        Ok(verification.verification_status == "SUCCESS")
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Cents to the provider's decimal string, e.g. `4000` -> `"40.00"`.
pub fn format_amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Assemble the verify-webhook-signature request body, or `None` when any
/// transmission header is missing or the payload is not a JSON event.
fn build_verification_body(
    headers: &WebhookHeaders,
    webhook_id: &str,
    payload: &[u8],
) -> Option<serde_json::Value> {
    let mut values = Vec::with_capacity(TRANSMISSION_HEADERS.len());
    for name in TRANSMISSION_HEADERS {
        values.push(headers.get(name)?.as_str());
    }
    let event: serde_json::Value = serde_json::from_slice(payload).ok()?;

    Some(json!({
        "auth_algo": values[0],
        "cert_url": values[1],
        "transmission_id": values[2],
        "transmission_sig": values[3],
        "transmission_time": values[4],
        "webhook_id": webhook_id,
        "webhook_event": event,
    }))
}

// ---------------------------------------------------------------------------
// Event parsing
// ---------------------------------------------------------------------------

/// A webhook event reduced to what fulfillment needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayPalEvent {
    /// Provider event type, e.g. `PAYMENT.CAPTURE.COMPLETED`.
    pub event_type: String,
    /// The order id carried in the resource's `custom_id`, when present.
    pub order_id: Option<DbId>,
}

/// Event type signalling a settled capture.
pub const EVENT_CAPTURE_COMPLETED: &str = "PAYMENT.CAPTURE.COMPLETED";

/// Parse a verified webhook payload.
pub fn parse_event(payload: &[u8]) -> Result<PayPalEvent, PaymentError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|e| PaymentError::Payload(e.to_string()))?;

    let event_type = value
        .get("event_type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| PaymentError::Payload("event has no event_type".to_string()))?
        .to_string();

    let order_id = value
        .pointer("/resource/custom_id")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<DbId>().ok());

    Ok(PayPalEvent {
        event_type,
        order_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn transmission_headers() -> WebhookHeaders {
        let mut headers = HashMap::new();
        headers.insert("paypal-auth-algo".to_string(), "SHA256withRSA".to_string());
        headers.insert(
            "paypal-cert-url".to_string(),
            "https://api.sandbox.paypal.com/cert".to_string(),
        );
        headers.insert("paypal-transmission-id".to_string(), "tid-1".to_string());
        headers.insert("paypal-transmission-sig".to_string(), "sig==".to_string());
        headers.insert(
            "paypal-transmission-time".to_string(),
            "2026-08-04T12:00:00Z".to_string(),
        );
        headers
    }

    #[test]
    fn amounts_format_as_dollars_and_cents() {
        assert_eq!(format_amount(4000), "40.00");
        assert_eq!(format_amount(205), "2.05");
        assert_eq!(format_amount(99), "0.99");
        assert_eq!(format_amount(100_000), "1000.00");
    }

    #[test]
    fn verification_body_carries_all_transmission_fields() {
        let body = build_verification_body(
            &transmission_headers(),
            "wh-123",
            br#"{"event_type":"PAYMENT.CAPTURE.COMPLETED"}"#,
        )
        .unwrap();

        assert_eq!(body["auth_algo"], "SHA256withRSA");
        assert_eq!(body["transmission_id"], "tid-1");
        assert_eq!(body["webhook_id"], "wh-123");
        assert_eq!(
            body["webhook_event"]["event_type"],
            "PAYMENT.CAPTURE.COMPLETED"
        );
    }

    #[test]
    fn missing_transmission_header_yields_no_body() {
        let mut headers = transmission_headers();
        headers.remove("paypal-transmission-sig");
        assert!(build_verification_body(&headers, "wh-123", b"{}").is_none());
    }

    #[test]
    fn non_json_payload_yields_no_body() {
        assert!(build_verification_body(&transmission_headers(), "wh-123", b"<xml/>").is_none());
    }

    #[test]
    fn parse_event_extracts_custom_id() {
        let payload = br#"{
            "event_type": "PAYMENT.CAPTURE.COMPLETED",
            "resource": { "custom_id": "17", "status": "COMPLETED" }
        }"#;
        let event = parse_event(payload).unwrap();
        assert_eq!(event.event_type, EVENT_CAPTURE_COMPLETED);
        assert_eq!(event.order_id, Some(17));
    }

    #[test]
    fn parse_event_without_custom_id_has_no_order_id() {
        let payload = br#"{"event_type":"CHECKOUT.ORDER.APPROVED","resource":{}}"#;
        let event = parse_event(payload).unwrap();
        assert_eq!(event.order_id, None);
    }
}
