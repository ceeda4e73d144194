//! Shared test harness: the production router wired with test doubles for
//! the payment gateways, blob store, and notifier.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{HeaderName, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::util::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use beatstore_api::auth::password::hash_password;
use beatstore_api::config::{
    AdminConfig, DeliveryConfig, GuardConfig, ServerConfig, SessionConfig,
};
use beatstore_api::middleware::throttle::Guard;
use beatstore_api::routes;
use beatstore_api::state::AppState;
use beatstore_core::types::DbId;
use beatstore_db::models::beat::CreateBeat;
use beatstore_db::repositories::BeatRepo;
use beatstore_notify::{NotifyError, PurchaseEmail, PurchaseNotifier};
use beatstore_payments::{
    CaptureOutcome, PaymentError, PaymentGateway, PaymentIntent, WebhookHeaders,
};
use beatstore_storage::{BlobError, BlobStore};

pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_PASSWORD: &str = "test-admin-password";
pub const TEST_STRIPE_WEBHOOK_SECRET: &str = "whsec_test_secret";

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

/// Configurable payment gateway double.
pub struct MockGateway {
    pub provider_ref: String,
    pub client_secret: Option<String>,
    pub capture_completed: bool,
    pub verify_ok: bool,
    pub fail_create: bool,
}

impl MockGateway {
    pub fn stripe_like() -> Self {
        Self {
            provider_ref: "pi_test_1".to_string(),
            client_secret: Some("pi_test_1_secret".to_string()),
            capture_completed: true,
            verify_ok: true,
            fail_create: false,
        }
    }

    pub fn paypal_like() -> Self {
        Self {
            provider_ref: "pp_test_1".to_string(),
            client_secret: None,
            capture_completed: true,
            verify_ok: true,
            fail_create: false,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create(
        &self,
        _amount_cents: i64,
        _order_id: DbId,
    ) -> Result<PaymentIntent, PaymentError> {
        if self.fail_create {
            return Err(PaymentError::Provider("simulated outage".to_string()));
        }
        Ok(PaymentIntent {
            provider_ref: self.provider_ref.clone(),
            client_secret: self.client_secret.clone(),
        })
    }

    async fn capture(&self, _provider_ref: &str) -> Result<CaptureOutcome, PaymentError> {
        Ok(CaptureOutcome {
            completed: self.capture_completed,
            raw_status: if self.capture_completed {
                "COMPLETED".to_string()
            } else {
                "PENDING".to_string()
            },
        })
    }

    async fn verify_webhook(
        &self,
        _headers: &WebhookHeaders,
        _payload: &[u8],
    ) -> Result<bool, PaymentError> {
        Ok(self.verify_ok)
    }
}

/// Notifier double recording every confirmation it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<PurchaseEmail>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<PurchaseEmail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PurchaseNotifier for RecordingNotifier {
    async fn send_confirmation(&self, email: &PurchaseEmail) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(NotifyError::Build("simulated SMTP outage".to_string()));
        }
        Ok(())
    }
}

/// Blob store double producing recognizable fake signed URLs.
pub struct MockBlobStore;

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        _expires_in: Duration,
    ) -> Result<String, BlobError> {
        Ok(format!("https://files.test/{key}?sig=stub&name={filename}"))
    }
}

// ---------------------------------------------------------------------------
// State / app construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig`: known admin credentials, generous rate
/// limits, no artificial login delay.
pub fn test_config() -> ServerConfig {
    static ADMIN_HASH: OnceLock<String> = OnceLock::new();
    let password_hash = ADMIN_HASH
        .get_or_init(|| hash_password(TEST_ADMIN_PASSWORD).expect("hashing should succeed"))
        .clone();

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:3000".to_string(),
        producer_name: "Test Producer".to_string(),
        session: SessionConfig {
            secret: "test-session-secret-long-enough".to_string(),
            ttl_hours: 24,
        },
        admin: AdminConfig {
            username: TEST_ADMIN_USERNAME.to_string(),
            password_hash,
        },
        guard: GuardConfig {
            api_limit: 10_000,
            api_window_secs: 900,
            auth_limit: 10_000,
            auth_window_secs: 900,
            download_limit: 10_000,
            download_window_secs: 3600,
            lockout_threshold: 5,
            lockout_secs: 1800,
            auth_failure_delay_ms: 0,
        },
        delivery: DeliveryConfig {
            max_downloads: 5,
            token_ttl_days: 7,
            url_ttl_secs: 3600,
        },
    }
}

/// App state plus handles onto the doubles tests assert against.
pub struct TestContext {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
}

/// Build an `AppState` backed by mocks and the recording notifier.
pub fn test_state(pool: PgPool) -> TestContext {
    test_state_with(pool, test_config())
}

pub fn test_state_with(pool: PgPool, config: ServerConfig) -> TestContext {
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        pool,
        guard: Arc::new(Guard::from_config(&config.guard)),
        config: Arc::new(config),
        stripe: Arc::new(MockGateway::stripe_like()),
        paypal: Arc::new(MockGateway::paypal_like()),
        blobs: Arc::new(MockBlobStore),
        notifier: Some(notifier.clone()),
    };
    TestContext { state, notifier }
}

/// Build the application router with the same middleware stack `main.rs`
/// uses (minus CORS, which needs no exercise here).
pub fn build_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}

/// One-stop default: router + notifier handle over a fresh pool.
pub fn build_test_app(pool: PgPool) -> (Router, Arc<RecordingNotifier>) {
    let ctx = test_state(pool);
    (build_app(ctx.state), ctx.notifier)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_with_cookie(app: Router, path: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, path: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_with_cookie(
    app: Router,
    path: &str,
    body: serde_json::Value,
    cookie: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, cookie)
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST raw bytes with arbitrary headers (webhook deliveries).
pub async fn post_raw(
    app: Router,
    path: &str,
    headers: &[(&str, &str)],
    body: Vec<u8>,
) -> Response<Body> {
    let mut builder = Request::builder().method("POST").uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

pub async fn delete(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete_with_cookie(app: Router, path: &str, cookie: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(path)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a beat priced at $20.00 base / $500.00 exclusive override.
pub async fn seed_beat(pool: &PgPool, title: &str) -> beatstore_db::models::beat::Beat {
    BeatRepo::create(
        pool,
        &CreateBeat {
            title: title.to_string(),
            bpm: 140,
            musical_key: "A minor".to_string(),
            genre: "Trap".to_string(),
            tags: vec!["dark".to_string()],
            price_cents: 2000,
            exclusive_price_cents: Some(50_000),
            artwork_url: None,
            preview_url: None,
            mp3_key: format!("beats/{title}/audio.mp3"),
            wav_key: format!("beats/{title}/audio.wav"),
            duration_secs: Some(180),
        },
    )
    .await
    .expect("beat fixture should insert")
}

/// Run a checkout through the API, returning the parsed response JSON.
pub async fn checkout(
    app: Router,
    beat_id: DbId,
    tier: &str,
    payment_method: &str,
) -> serde_json::Value {
    let body = serde_json::json!({
        "items": [{ "beatId": beat_id, "licenseType": tier }],
        "email": "buyer@example.com",
        "customerName": "Buyer",
        "paymentMethod": payment_method,
    });
    let response = post_json(app, "/api/v1/checkout", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Log the admin in and return the session cookie pair (`name=value`).
pub async fn admin_cookie(app: Router) -> String {
    let body = serde_json::json!({
        "username": TEST_ADMIN_USERNAME,
        "password": TEST_ADMIN_PASSWORD,
    });
    let response = post_json(app, "/api/v1/auth/session", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("login must set the session cookie")
        .to_str()
        .unwrap();
    set_cookie
        .split(';')
        .next()
        .expect("cookie has a name=value part")
        .to_string()
}
