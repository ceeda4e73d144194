//! Repository for the `orders` and `order_items` tables.
//!
//! The two state transitions that may race (fulfillment triggers, download
//! redemptions) are conditional UPDATEs so the database arbitrates, not the
//! application.

use beatstore_core::types::DbId;
use sqlx::PgPool;

use crate::models::order::{CreateOrder, Order, OrderItem, OrderItemDetail, OrderItemInput};
use crate::models::status::OrderStatus;

/// Column list for `orders` queries.
const COLUMNS: &str = "\
    id, email, customer_name, total_cents, status, payment_provider, \
    payment_ref, download_token, download_count, max_downloads, \
    token_expires_at, created_at";

/// Column list for `order_items` queries.
const ITEM_COLUMNS: &str = "id, order_id, beat_id, price_cents, license_type, created_at";

/// Order lifecycle operations.
pub struct OrderRepo;

impl OrderRepo {
    /// Create an order and its line items in one transaction. Either the
    /// whole order exists afterwards or none of it does.
    pub async fn create_with_items(
        pool: &PgPool,
        input: &CreateOrder,
        items: &[OrderItemInput],
    ) -> Result<Order, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO orders (email, customer_name, total_cents, status, \
                 payment_provider, payment_ref, download_token, max_downloads, \
                 token_expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(&input.email)
            .bind(&input.customer_name)
            .bind(input.total_cents)
            .bind(OrderStatus::Pending.as_str())
            .bind(input.payment_provider.as_str())
            .bind(&input.payment_ref)
            .bind(&input.download_token)
            .bind(input.max_downloads)
            .bind(input.token_expires_at)
            .fetch_one(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, beat_id, price_cents, license_type) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id)
            .bind(item.beat_id)
            .bind(item.price_cents)
            .bind(item.license_type.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    /// Replace the placeholder payment reference with the provider's.
    pub async fn set_payment_ref(
        pool: &PgPool,
        order_id: DbId,
        payment_ref: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE orders SET payment_ref = $2 WHERE id = $1")
            .bind(order_id)
            .bind(payment_ref)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up an order by its download token, the only client-facing key.
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE download_token = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Line items of one order.
    pub async fn items(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// Line items joined with their beats, for one order.
    pub async fn items_with_beats(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
        Self::items_for_orders(pool, &[order_id]).await
    }

    /// Line items joined with their beats, for a batch of orders.
    pub async fn items_for_orders(
        pool: &PgPool,
        order_ids: &[DbId],
    ) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
        sqlx::query_as::<_, OrderItemDetail>(
            "SELECT oi.order_id, oi.beat_id, oi.price_cents, oi.license_type, \
                    b.title AS beat_title, b.mp3_key, b.wav_key \
             FROM order_items oi \
             JOIN beats b ON b.id = oi.beat_id \
             WHERE oi.order_id = ANY($1) \
             ORDER BY oi.id",
        )
        .bind(order_ids)
        .fetch_all(pool)
        .await
    }

    /// Compare-and-swap PENDING -> COMPLETED. Returns `true` when this call
    /// performed the transition; `false` means another trigger got there
    /// first (or the order is FAILED) and the caller must re-read.
    pub async fn complete_if_pending(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1 AND status = $3")
            .bind(order_id)
            .bind(OrderStatus::Completed.as_str())
            .bind(OrderStatus::Pending.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Compare-and-swap PENDING -> FAILED. A COMPLETED order is never
    /// demoted by a late failure event.
    pub async fn fail_if_pending(pool: &PgPool, order_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1 AND status = $3")
            .bind(order_id)
            .bind(OrderStatus::Failed.as_str())
            .bind(OrderStatus::Pending.as_str())
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Atomically claim one download. Returns the new count, or `None` when
    /// the quota is already exhausted; concurrent redemptions can never push
    /// the count past `max_downloads`.
    pub async fn redeem_download(pool: &PgPool, order_id: DbId) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE orders SET download_count = download_count + 1 \
             WHERE id = $1 AND download_count < max_downloads \
             RETURNING download_count",
        )
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(count,)| count))
    }

    /// Most recent orders for the admin dashboard.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders ORDER BY created_at DESC LIMIT $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
