//! The fulfillment engine: turns a payment confirmation into a COMPLETED
//! order with delivery rights, exactly once.
//!
//! Callable from three triggers (intent-provider webhook, redirect-provider
//! webhook, explicit capture), any of which may race for the same order. The
//! compare-and-swap on the order status inside [`OrderRepo::complete_if_pending`]
//! is the sole correctness mechanism: whichever trigger wins performs the
//! side effects, every other one sees [`FulfillmentOutcome::AlreadyCompleted`].

use beatstore_core::document::{render_pdf, LicenseDocument};
use beatstore_core::error::CoreError;
use beatstore_core::license::LicenseTier;
use beatstore_core::slug::slugify;
use beatstore_core::types::DbId;
use beatstore_db::models::status::OrderStatus;
use beatstore_db::repositories::{BeatRepo, OrderRepo};
use beatstore_notify::{LicenseAttachment, NotifyError, PurchaseEmail, PurchaseLine};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// What a fulfillment call did.
#[derive(Debug)]
pub enum FulfillmentOutcome {
    /// This call performed the PENDING -> COMPLETED transition. A failed
    /// confirmation email does not roll that back; the error is carried
    /// here so the trigger can log it.
    Fulfilled {
        notification_error: Option<NotifyError>,
    },
    /// The order was already COMPLETED; nothing was changed.
    AlreadyCompleted,
}

/// Fulfill `order_id`: mark it COMPLETED, flip the sold flag of exclusively
/// sold beats, generate one license document per line item, and send the
/// confirmation email with the download link.
pub async fn fulfill_order(state: &AppState, order_id: DbId) -> AppResult<FulfillmentOutcome> {
    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;

    if !OrderRepo::complete_if_pending(&state.pool, order_id).await? {
        // Lost the race or the order is in a terminal state; re-read to
        // tell which.
        let current = OrderRepo::find_by_id(&state.pool, order_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Order",
                id: order_id,
            }))?;
        return match OrderStatus::parse(&current.status)? {
            OrderStatus::Completed => Ok(FulfillmentOutcome::AlreadyCompleted),
            _ => Err(AppError::Core(CoreError::Forbidden(
                "Order can no longer be fulfilled".to_string(),
            ))),
        };
    }

    let items = OrderRepo::items_with_beats(&state.pool, order_id).await?;

    for item in &items {
        if item.license_type == LicenseTier::Exclusive.as_str() {
            BeatRepo::mark_sold(&state.pool, item.beat_id).await?;
        }
    }

    tracing::info!(order_id, items = items.len(), "Order fulfilled");

    // One license document per line item, all attached to one email.
    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let order_reference = order.id.to_string();
    let customer_name = order
        .customer_name
        .clone()
        .unwrap_or_else(|| "Customer".to_string());

    let mut lines = Vec::with_capacity(items.len());
    let mut attachments = Vec::with_capacity(items.len());
    for item in &items {
        let tier = LicenseTier::parse(&item.license_type)?;
        let document = LicenseDocument {
            customer_name: &customer_name,
            customer_email: &order.email,
            beat_title: &item.beat_title,
            tier,
            order_reference: &order_reference,
            date: &date,
            producer_name: &state.config.producer_name,
        };
        attachments.push(LicenseAttachment {
            filename: format!("license-{}.pdf", slugify(&item.beat_title)),
            bytes: render_pdf(&document),
        });
        lines.push(PurchaseLine {
            title: item.beat_title.clone(),
            license_type: item.license_type.clone(),
            price_cents: item.price_cents,
        });
    }

    let notification_error = match &state.notifier {
        Some(notifier) => {
            let email = PurchaseEmail {
                to: order.email.clone(),
                customer_name: order.customer_name.clone(),
                download_url: format!(
                    "{}/api/v1/downloads/{}",
                    state.config.public_base_url, order.download_token
                ),
                lines,
                total_cents: order.total_cents,
                attachments,
            };
            match notifier.send_confirmation(&email).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::error!(order_id, error = %e, "Confirmation email failed");
                    Some(e)
                }
            }
        }
        None => {
            tracing::warn!(order_id, "No notifier configured; skipping confirmation email");
            None
        }
    };

    Ok(FulfillmentOutcome::Fulfilled { notification_error })
}
