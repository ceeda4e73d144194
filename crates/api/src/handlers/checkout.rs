//! The checkout orchestrator and the explicit capture endpoint.

use std::collections::BTreeSet;

use axum::extract::State;
use axum::Json;
use beatstore_core::error::CoreError;
use beatstore_core::license::LicenseTier;
use beatstore_core::token::generate_download_token;
use beatstore_core::types::DbId;
use beatstore_core::validate::is_valid_email;
use beatstore_db::models::order::{CreateOrder, OrderItemInput};
use beatstore_db::models::status::PaymentProvider;
use beatstore_db::repositories::{BeatRepo, OrderRepo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::fulfillment::{fulfill_order, FulfillmentOutcome};
use crate::middleware::throttle::ApiRate;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/v1/checkout`.
///
/// Required fields are modelled as `Option` so their absence can be answered
/// with a 400 validation error rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    pub email: Option<String>,
    pub customer_name: Option<String>,
    /// `"stripe"` or `"paypal"`.
    pub payment_method: Option<String>,
}

/// One cart line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub beat_id: DbId,
    pub license_type: String,
    /// Accepted and discarded: prices are computed server-side only.
    #[serde(default)]
    pub price: Option<serde_json::Value>,
}

/// Response for `POST /api/v1/checkout`. Exactly one of `client_secret` /
/// `paypal_order_id` is present, matching the chosen payment flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paypal_order_id: Option<String>,
    pub order_id: DbId,
}

/// Request body for `POST /api/v1/checkout/paypal-capture`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub paypal_order_id: Option<String>,
    pub order_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/checkout
///
/// Validates the cart, prices it server-side, opens a PENDING order, and
/// asks the chosen payment gateway for a payable intent.
pub async fn checkout(
    _rate: ApiRate,
    State(state): State<AppState>,
    Json(input): Json<CheckoutRequest>,
) -> AppResult<Json<CheckoutResponse>> {
    // 1. Shape validation, before touching the store.
    if input.items.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Cart must not be empty".to_string(),
        )));
    }
    let email = input
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Core(CoreError::Validation("Email is required".to_string())))?;
    if !is_valid_email(email) {
        return Err(AppError::Core(CoreError::Validation(
            "Invalid email address".to_string(),
        )));
    }
    let method = match input.payment_method.as_deref() {
        Some("stripe") => PaymentProvider::Stripe,
        Some("paypal") => PaymentProvider::Paypal,
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "Invalid payment method".to_string(),
            )))
        }
    };

    let mut tiers = Vec::with_capacity(input.items.len());
    for item in &input.items {
        tiers.push(LicenseTier::parse(&item.license_type)?);
    }

    // 2. Availability: every distinct beat must exist and be active, and no
    //    requested beat may already be exclusively sold (any tier).
    let distinct_ids: BTreeSet<DbId> = input.items.iter().map(|i| i.beat_id).collect();
    let ids: Vec<DbId> = distinct_ids.iter().copied().collect();
    let beats = BeatRepo::find_active_by_ids(&state.pool, &ids).await?;
    if beats.len() < distinct_ids.len() || beats.iter().any(|b| b.is_sold) {
        return Err(AppError::Core(CoreError::UnavailableItem(
            "One or more beats are unavailable".to_string(),
        )));
    }

    // 3. Server-side pricing; the client's numbers are never consulted.
    let mut line_items = Vec::with_capacity(input.items.len());
    let mut total_cents: i64 = 0;
    for (item, tier) in input.items.iter().zip(tiers) {
        let beat = beats
            .iter()
            .find(|b| b.id == item.beat_id)
            .expect("availability check guarantees presence");
        let price_cents = beat.price_for(tier);
        total_cents += price_cents;
        line_items.push(OrderItemInput {
            beat_id: beat.id,
            price_cents,
            license_type: tier,
        });
    }

    // 4. Open the PENDING order atomically with its items.
    let order = OrderRepo::create_with_items(
        &state.pool,
        &CreateOrder {
            email: email.to_string(),
            customer_name: input.customer_name.clone().filter(|n| !n.trim().is_empty()),
            total_cents,
            payment_provider: method,
            payment_ref: format!("pending_{}", Uuid::new_v4()),
            download_token: generate_download_token(),
            max_downloads: state.config.delivery.max_downloads,
            token_expires_at: chrono::Utc::now()
                + chrono::Duration::days(state.config.delivery.token_ttl_days),
        },
        &line_items,
    )
    .await?;

    // 5. Ask the provider for a payable object. A failure here leaves the
    //    PENDING order in place; no funds have moved and nothing retries it.
    let gateway = match method {
        PaymentProvider::Stripe => &state.stripe,
        PaymentProvider::Paypal => &state.paypal,
    };
    let intent = gateway
        .create(total_cents, order.id)
        .await
        .map_err(|e| AppError::Core(CoreError::Provider(e.to_string())))?;

    OrderRepo::set_payment_ref(&state.pool, order.id, &intent.provider_ref).await?;

    tracing::info!(
        order_id = order.id,
        total_cents,
        provider = method.as_str(),
        "Checkout opened"
    );

    // 6. Hand back exactly what the chosen flow needs.
    let response = match method {
        PaymentProvider::Stripe => CheckoutResponse {
            client_secret: Some(intent.client_secret.ok_or_else(|| {
                AppError::Core(CoreError::Provider(
                    "provider returned no client secret".to_string(),
                ))
            })?),
            paypal_order_id: None,
            order_id: order.id,
        },
        PaymentProvider::Paypal => CheckoutResponse {
            client_secret: None,
            paypal_order_id: Some(intent.provider_ref),
            order_id: order.id,
        },
    };
    Ok(Json(response))
}

/// POST /api/v1/checkout/paypal-capture
///
/// Explicit settlement for the redirect flow: capture the provider order,
/// then fulfill. The submitted provider order id must match the reference
/// stored at checkout.
pub async fn paypal_capture(
    _rate: ApiRate,
    State(state): State<AppState>,
    Json(input): Json<CaptureRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let (Some(paypal_order_id), Some(order_id)) = (input.paypal_order_id, input.order_id) else {
        return Err(AppError::Core(CoreError::Validation(
            "Missing required fields".to_string(),
        )));
    };

    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;

    if order.payment_provider != PaymentProvider::Paypal.as_str()
        || order.payment_ref != paypal_order_id
    {
        return Err(AppError::Core(CoreError::Validation(
            "Payment reference does not match this order".to_string(),
        )));
    }

    let outcome = state
        .paypal
        .capture(&paypal_order_id)
        .await
        .map_err(|e| AppError::Core(CoreError::Provider(e.to_string())))?;

    if !outcome.completed {
        tracing::warn!(order_id, status = %outcome.raw_status, "Capture not completed");
        return Err(AppError::BadRequest("Payment not completed".to_string()));
    }

    match fulfill_order(&state, order_id).await? {
        FulfillmentOutcome::Fulfilled {
            notification_error: Some(e),
        } => {
            // The order is settled; a bounced email must not fail the capture.
            tracing::error!(order_id, error = %e, "Fulfilled but confirmation email failed");
        }
        FulfillmentOutcome::Fulfilled { .. } | FulfillmentOutcome::AlreadyCompleted => {}
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
