//! HTTP-level tests for the public catalog and the admin catalog surface.

mod common;

use axum::http::StatusCode;
use common::{
    admin_cookie, body_json, delete_with_cookie, get, post_json, post_json_with_cookie, seed_beat,
};
use sqlx::PgPool;

use beatstore_db::repositories::BeatRepo;

// ---------------------------------------------------------------------------
// Public catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_shows_active_beats_without_object_keys(pool: PgPool) {
    seed_beat(&pool, "Visible").await;
    let hidden = seed_beat(&pool, "Hidden").await;
    BeatRepo::deactivate(&pool, hidden.id).await.unwrap();
    let (app, _) = common::build_test_app(pool);

    let response = get(app, "/api/v1/beats").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let beats = json.as_array().unwrap();
    assert_eq!(beats.len(), 1);
    assert_eq!(beats[0]["title"], "Visible");
    assert_eq!(beats[0]["priceCents"].as_i64(), None, "snake_case fields");
    assert_eq!(beats[0]["price_cents"], 2000);
    assert!(beats[0].get("mp3_key").is_none(), "object keys stay private");
    assert!(beats[0].get("wav_key").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_filters_by_query_and_genre(pool: PgPool) {
    seed_beat(&pool, "Night Rider").await;
    seed_beat(&pool, "Sunrise").await;
    let (app, _) = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/beats?q=night").await;
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["title"], "Night Rider");

    // Both fixtures share the genre; an unknown genre matches nothing.
    let response = get(app.clone(), "/api/v1/beats?genre=trap").await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = get(app, "/api/v1/beats?genre=jazz").await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn play_counter_increments(pool: PgPool) {
    let beat = seed_beat(&pool, "Spinning").await;
    let (app, _) = common::build_test_app(pool.clone());

    for _ in 0..3 {
        let response = post_json(
            app.clone(),
            &format!("/api/v1/beats/{}/play", beat.id),
            serde_json::json!({}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let found = BeatRepo::find_by_id(&pool, beat.id).await.unwrap().unwrap();
    assert_eq!(found.plays, 3);

    let response = post_json(app, "/api/v1/beats/999999/play", serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Admin catalog
// ---------------------------------------------------------------------------

fn beat_payload(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "bpm": 142,
        "musical_key": "G minor",
        "genre": "Drill",
        "tags": ["sliding", "808"],
        "price_cents": 2500,
        "exclusive_price_cents": 60000,
        "mp3_key": "beats/new/audio.mp3",
        "wav_key": "beats/new/audio.wav",
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_creates_a_beat_with_a_derived_slug(pool: PgPool) {
    let (app, _) = common::build_test_app(pool);
    let cookie = admin_cookie(app.clone()).await;

    let response = post_json_with_cookie(
        app.clone(),
        "/api/v1/admin/beats",
        beat_payload("Cold Snap!"),
        &cookie,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["slug"], "cold-snap");
    assert_eq!(json["data"]["is_active"], true);

    // Same title again: the slug picks up a suffix.
    let response = post_json_with_cookie(
        app,
        "/api/v1/admin/beats",
        beat_payload("Cold Snap!"),
        &cookie,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let slug = json["data"]["slug"].as_str().unwrap();
    assert!(slug.starts_with("cold-snap-") && slug != "cold-snap");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_beat_validation_rejects_bad_input(pool: PgPool) {
    let (app, _) = common::build_test_app(pool);
    let cookie = admin_cookie(app.clone()).await;

    let mut missing_title = beat_payload("x");
    missing_title["title"] = serde_json::json!("   ");
    let mut bad_bpm = beat_payload("y");
    bad_bpm["bpm"] = serde_json::json!(0);

    for payload in [missing_title, bad_bpm] {
        let response =
            post_json_with_cookie(app.clone(), "/api/v1/admin/beats", payload, &cookie).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_deactivation_soft_deletes(pool: PgPool) {
    let beat = seed_beat(&pool, "Retiring").await;
    let (app, _) = common::build_test_app(pool.clone());
    let cookie = admin_cookie(app.clone()).await;

    let response =
        delete_with_cookie(app.clone(), &format!("/api/v1/admin/beats/{}", beat.id), &cookie).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone from the public listing, still present in the admin listing.
    let public = body_json(get(app.clone(), "/api/v1/beats").await).await;
    assert_eq!(public.as_array().unwrap().len(), 0);

    let admin = body_json(get_admin(app, &cookie).await).await;
    assert_eq!(admin["data"].as_array().unwrap().len(), 1);
    assert_eq!(admin["data"][0]["is_active"], false);
}

async fn get_admin(app: axum::Router, cookie: &str) -> axum::http::Response<axum::body::Body> {
    common::get_with_cookie(app, "/api/v1/admin/beats", cookie).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_orders_include_line_items(pool: PgPool) {
    let beat = seed_beat(&pool, "Sold Item").await;
    let ctx = common::test_state(pool.clone());
    let app = common::build_app(ctx.state.clone());

    let json = common::checkout(app.clone(), beat.id, "PREMIUM", "stripe").await;
    let order_id = json["orderId"].as_i64().unwrap();

    let cookie = admin_cookie(app.clone()).await;
    let response = common::get_with_cookie(app, "/api/v1/admin/orders", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let orders = json["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order_id);
    assert_eq!(orders[0]["items"][0]["beat_title"], "Sold Item");
    assert_eq!(orders[0]["items"][0]["price_cents"], 4000);
}
