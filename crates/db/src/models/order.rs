//! Order and line-item models.

use beatstore_core::license::LicenseTier;
use beatstore_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use super::status::PaymentProvider;

/// A row from the `orders` table.
///
/// `download_token` is the only client-facing credential for an order, so
/// this struct is never serialized wholesale into a public response either;
/// handlers pick the fields they may expose.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub email: String,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub status: String,
    pub payment_provider: String,
    pub payment_ref: String,
    pub download_token: String,
    pub download_count: i32,
    pub max_downloads: i32,
    pub token_expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// Input for creating an order row. Items are supplied separately and
/// written in the same transaction.
#[derive(Debug)]
pub struct CreateOrder {
    pub email: String,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub payment_provider: PaymentProvider,
    /// Placeholder until the provider assigns a real reference.
    pub payment_ref: String,
    pub download_token: String,
    pub max_downloads: i32,
    pub token_expires_at: Timestamp,
}

/// One line item to write alongside a new order. The price is the
/// server-computed quote, never client input.
#[derive(Debug)]
pub struct OrderItemInput {
    pub beat_id: DbId,
    pub price_cents: i64,
    pub license_type: LicenseTier,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub beat_id: DbId,
    pub price_cents: i64,
    pub license_type: String,
    pub created_at: Timestamp,
}

/// Line item joined with the beat columns fulfillment and delivery need.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItemDetail {
    pub order_id: DbId,
    pub beat_id: DbId,
    pub price_cents: i64,
    pub license_type: String,
    pub beat_title: String,
    pub mp3_key: String,
    pub wav_key: String,
}
