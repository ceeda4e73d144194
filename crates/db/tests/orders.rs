//! Repository-level tests for order creation, the fulfillment CAS, and the
//! download quota.

use beatstore_core::license::LicenseTier;
use beatstore_core::token::generate_download_token;
use beatstore_db::models::beat::CreateBeat;
use beatstore_db::models::order::{CreateOrder, OrderItemInput};
use beatstore_db::models::status::{OrderStatus, PaymentProvider};
use beatstore_db::repositories::{BeatRepo, OrderRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_beat(title: &str) -> CreateBeat {
    CreateBeat {
        title: title.to_string(),
        bpm: 120,
        musical_key: "F minor".to_string(),
        genre: "Boom Bap".to_string(),
        tags: vec![],
        price_cents: 2000,
        exclusive_price_cents: Some(50_000),
        artwork_url: None,
        preview_url: None,
        mp3_key: format!("beats/{title}/audio.mp3"),
        wav_key: format!("beats/{title}/audio.wav"),
        duration_secs: None,
    }
}

fn new_order(total_cents: i64) -> CreateOrder {
    CreateOrder {
        email: "buyer@example.com".to_string(),
        customer_name: Some("Buyer".to_string()),
        total_cents,
        payment_provider: PaymentProvider::Stripe,
        payment_ref: "pending_placeholder".to_string(),
        download_token: generate_download_token(),
        max_downloads: 5,
        token_expires_at: chrono::Utc::now() + chrono::Duration::days(7),
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn order_and_items_are_created_together(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("First")).await.unwrap();

    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(4000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 4000,
            license_type: LicenseTier::Premium,
        }],
    )
    .await
    .unwrap();

    assert_eq!(order.status, OrderStatus::Pending.as_str());
    assert_eq!(order.download_count, 0);
    assert_eq!(order.max_downloads, 5);

    let items = OrderRepo::items(&pool, order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].beat_id, beat.id);
    assert_eq!(items[0].price_cents, 4000);
    assert_eq!(items[0].license_type, "PREMIUM");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn item_insert_failure_rolls_back_the_order(pool: PgPool) {
    // Nonexistent beat id violates the FK, so the whole transaction must go.
    let result = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: 424_242,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await;

    assert!(result.is_err());
    let orders = OrderRepo::list_recent(&pool, 10).await.unwrap();
    assert!(orders.is_empty(), "no orphaned order row may survive");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_ref_replaces_the_placeholder(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Ref")).await.unwrap();
    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await
    .unwrap();

    OrderRepo::set_payment_ref(&pool, order.id, "pi_12345").await.unwrap();

    let found = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(found.payment_ref, "pi_12345");
}

// ---------------------------------------------------------------------------
// Status CAS
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn complete_if_pending_succeeds_exactly_once(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Once")).await.unwrap();
    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await
    .unwrap();

    assert!(OrderRepo::complete_if_pending(&pool, order.id).await.unwrap());
    // Second trigger loses the race.
    assert!(!OrderRepo::complete_if_pending(&pool, order.id).await.unwrap());

    let found = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(found.status, OrderStatus::Completed.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_never_demotes_a_completed_order(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Keep")).await.unwrap();
    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await
    .unwrap();

    assert!(OrderRepo::complete_if_pending(&pool, order.id).await.unwrap());
    assert!(!OrderRepo::fail_if_pending(&pool, order.id).await.unwrap());

    let found = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(found.status, OrderStatus::Completed.as_str());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pending_orders_can_fail(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Declined")).await.unwrap();
    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await
    .unwrap();

    assert!(OrderRepo::fail_if_pending(&pool, order.id).await.unwrap());
    // A success event arriving after the failure does not resurrect it.
    assert!(!OrderRepo::complete_if_pending(&pool, order.id).await.unwrap());

    let found = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(found.status, OrderStatus::Failed.as_str());
}

// ---------------------------------------------------------------------------
// Download quota
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn redemption_stops_at_max_downloads(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Quota")).await.unwrap();
    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await
    .unwrap();

    for expected in 1..=5 {
        let count = OrderRepo::redeem_download(&pool, order.id).await.unwrap();
        assert_eq!(count, Some(expected));
    }

    // The sixth redemption finds the quota exhausted and changes nothing.
    assert_eq!(OrderRepo::redeem_download(&pool, order.id).await.unwrap(), None);

    let found = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(found.download_count, 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_redemptions_never_exceed_the_quota(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Race")).await.unwrap();
    let order = OrderRepo::create_with_items(
        &pool,
        &new_order(2000),
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Basic,
        }],
    )
    .await
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..12 {
        let pool = pool.clone();
        let order_id = order.id;
        handles.push(tokio::spawn(async move {
            OrderRepo::redeem_download(&pool, order_id).await.unwrap()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            successes += 1;
        }
    }

    assert_eq!(successes, 5);
    let found = OrderRepo::find_by_id(&pool, order.id).await.unwrap().unwrap();
    assert_eq!(found.download_count, 5);
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn orders_are_found_by_token_only(pool: PgPool) {
    let beat = BeatRepo::create(&pool, &new_beat("Token")).await.unwrap();
    let input = new_order(2000);
    let token = input.download_token.clone();
    let order = OrderRepo::create_with_items(
        &pool,
        &input,
        &[OrderItemInput {
            beat_id: beat.id,
            price_cents: 2000,
            license_type: LicenseTier::Premium,
        }],
    )
    .await
    .unwrap();

    let found = OrderRepo::find_by_token(&pool, &token).await.unwrap().unwrap();
    assert_eq!(found.id, order.id);

    assert!(OrderRepo::find_by_token(&pool, "not-a-token").await.unwrap().is_none());

    let details = OrderRepo::items_with_beats(&pool, order.id).await.unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].beat_title, "Token");
    assert_eq!(details[0].license_type, "PREMIUM");
    assert!(details[0].wav_key.ends_with("audio.wav"));
}
