//! Inbound payment provider webhooks.
//!
//! Both endpoints verify authenticity before trusting anything in the body,
//! and both always acknowledge verified deliveries with 200: fulfillment is
//! idempotent, so a provider retry after a processing error is safe, and
//! refusing the acknowledgement would only cause a retry storm.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use beatstore_core::types::DbId;
use beatstore_db::repositories::OrderRepo;
use beatstore_payments::{paypal, stripe, WebhookHeaders};

use crate::error::{AppError, AppResult};
use crate::fulfillment::{fulfill_order, FulfillmentOutcome};
use crate::state::AppState;

/// POST /api/v1/webhooks/stripe
///
/// Signature-verified event intake for the intent-based provider.
/// `payment_intent.succeeded` fulfills the order named in the metadata;
/// `payment_intent.payment_failed` marks it FAILED; everything else is
/// acknowledged and ignored.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let header_map = lowercase_headers(&headers);
    let verified = state
        .stripe
        .verify_webhook(&header_map, &body)
        .await
        .map_err(|e| AppError::InternalError(format!("Webhook verification error: {e}")))?;
    if !verified {
        return Err(AppError::BadRequest("Invalid signature".to_string()));
    }

    let event = stripe::parse_event(&body)
        .map_err(|e| AppError::BadRequest(format!("Unreadable event: {e}")))?;

    match event.event_type.as_str() {
        stripe::EVENT_PAYMENT_SUCCEEDED => match event.order_id {
            Some(order_id) => run_fulfillment(&state, order_id).await,
            None => tracing::error!("Payment succeeded event carries no order id"),
        },
        stripe::EVENT_PAYMENT_FAILED => {
            if let Some(order_id) = event.order_id {
                if OrderRepo::fail_if_pending(&state.pool, order_id).await? {
                    tracing::info!(order_id, "Order marked failed by provider event");
                }
            }
        }
        other => {
            tracing::debug!(event_type = other, "Ignoring unhandled webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

/// POST /api/v1/webhooks/paypal
///
/// Remote-verified event intake for the redirect-capture provider.
/// `PAYMENT.CAPTURE.COMPLETED` fulfills the order named in `custom_id`.
pub async fn paypal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let header_map = lowercase_headers(&headers);
    let verified = state
        .paypal
        .verify_webhook(&header_map, &body)
        .await
        .map_err(|e| AppError::InternalError(format!("Webhook verification error: {e}")))?;
    if !verified {
        return Err(AppError::BadRequest("Invalid signature".to_string()));
    }

    let event = paypal::parse_event(&body)
        .map_err(|e| AppError::BadRequest(format!("Unreadable event: {e}")))?;

    match event.event_type.as_str() {
        paypal::EVENT_CAPTURE_COMPLETED => match event.order_id {
            Some(order_id) => run_fulfillment(&state, order_id).await,
            None => tracing::error!("Capture completed event carries no order id"),
        },
        other => {
            tracing::debug!(event_type = other, "Ignoring unhandled webhook event");
        }
    }

    Ok(Json(serde_json::json!({ "received": true })))
}

/// Fulfill on behalf of a webhook: errors are logged, never bubbled, so the
/// delivery is still acknowledged.
async fn run_fulfillment(state: &AppState, order_id: DbId) {
    match fulfill_order(state, order_id).await {
        Ok(FulfillmentOutcome::Fulfilled {
            notification_error: Some(e),
        }) => {
            tracing::error!(order_id, error = %e, "Fulfilled but confirmation email failed");
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!(order_id, error = %e, "Webhook fulfillment failed");
        }
    }
}

/// Flatten axum's header map into the lowercased name/value pairs the
/// gateway verification contract expects.
fn lowercase_headers(headers: &HeaderMap) -> WebhookHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
