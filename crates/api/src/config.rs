//! Server configuration loaded from environment variables.

/// Top-level configuration.
///
/// Most fields have development-safe defaults; secrets (session signing key,
/// admin credentials, provider keys) must be provided and make startup panic
/// when missing, which is the desired fail-fast behaviour.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public base URL used to build emailed download links.
    pub public_base_url: String,
    /// Producer name printed on license documents.
    pub producer_name: String,
    /// Admin session cookie configuration.
    pub session: SessionConfig,
    /// The single administrative identity.
    pub admin: AdminConfig,
    /// Rate limiting and login lockout knobs.
    pub guard: GuardConfig,
    /// Download token lifetime and quota.
    pub delivery: DeliveryConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `3000`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:3000` |
    /// | `PRODUCER_NAME`        | `Beatstore`             |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let producer_name =
            std::env::var("PRODUCER_NAME").unwrap_or_else(|_| "Beatstore".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url,
            producer_name,
            session: SessionConfig::from_env(),
            admin: AdminConfig::from_env(),
            guard: GuardConfig::from_env(),
            delivery: DeliveryConfig::from_env(),
        }
    }
}

/// Admin session cookie configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// HMAC-SHA256 secret used to sign and verify session tokens.
    pub secret: String,
    /// Session lifetime in hours (default: 24).
    pub ttl_hours: i64,
}

impl SessionConfig {
    /// | Env Var             | Required | Default |
    /// |---------------------|----------|---------|
    /// | `SESSION_SECRET`    | **yes**  | --      |
    /// | `SESSION_TTL_HOURS` | no       | `24`    |
    ///
    /// # Panics
    ///
    /// Panics if `SESSION_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".into())
            .parse()
            .expect("SESSION_TTL_HOURS must be a valid i64");

        Self { secret, ttl_hours }
    }
}

/// The single administrative identity. There are no user accounts; one
/// username and one Argon2 PHC hash come from the environment.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Argon2id hash in PHC string format.
    pub password_hash: String,
}

impl AdminConfig {
    /// | Env Var               | Required |
    /// |-----------------------|----------|
    /// | `ADMIN_USERNAME`      | **yes**  |
    /// | `ADMIN_PASSWORD_HASH` | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics if either variable is missing.
    pub fn from_env() -> Self {
        Self {
            username: std::env::var("ADMIN_USERNAME")
                .expect("ADMIN_USERNAME must be set in the environment"),
            password_hash: std::env::var("ADMIN_PASSWORD_HASH")
                .expect("ADMIN_PASSWORD_HASH must be set in the environment"),
        }
    }
}

/// Rate limiting and login lockout knobs. All counters are per client IP.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// General API bucket: points per window.
    pub api_limit: u32,
    pub api_window_secs: u64,
    /// Authentication bucket: points per window.
    pub auth_limit: u32,
    pub auth_window_secs: u64,
    /// Download redemption bucket: points per window.
    pub download_limit: u32,
    pub download_window_secs: u64,
    /// Consecutive failures before lockout.
    pub lockout_threshold: u32,
    /// Lockout duration in seconds.
    pub lockout_secs: u64,
    /// Upper bound of the randomized delay added to failed logins, in
    /// milliseconds. The sampled delay ranges from a third of this value up
    /// to it. `0` disables the delay (tests).
    pub auth_failure_delay_ms: u64,
}

impl GuardConfig {
    /// | Env Var                 | Default |
    /// |-------------------------|---------|
    /// | `RATE_API_LIMIT`        | `100`   |
    /// | `RATE_API_WINDOW_SECS`  | `900`   |
    /// | `RATE_AUTH_LIMIT`       | `5`     |
    /// | `RATE_AUTH_WINDOW_SECS` | `900`   |
    /// | `RATE_DL_LIMIT`         | `10`    |
    /// | `RATE_DL_WINDOW_SECS`   | `3600`  |
    /// | `LOCKOUT_THRESHOLD`     | `5`     |
    /// | `LOCKOUT_SECS`          | `1800`  |
    /// | `AUTH_FAILURE_DELAY_MS` | `3000`  |
    pub fn from_env() -> Self {
        Self {
            api_limit: env_parse("RATE_API_LIMIT", 100),
            api_window_secs: env_parse("RATE_API_WINDOW_SECS", 900),
            auth_limit: env_parse("RATE_AUTH_LIMIT", 5),
            auth_window_secs: env_parse("RATE_AUTH_WINDOW_SECS", 900),
            download_limit: env_parse("RATE_DL_LIMIT", 10),
            download_window_secs: env_parse("RATE_DL_WINDOW_SECS", 3600),
            lockout_threshold: env_parse("LOCKOUT_THRESHOLD", 5),
            lockout_secs: env_parse("LOCKOUT_SECS", 1800),
            auth_failure_delay_ms: env_parse("AUTH_FAILURE_DELAY_MS", 3000),
        }
    }
}

/// Download token lifetime and quota.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Redemptions allowed per order.
    pub max_downloads: i32,
    /// Download token lifetime in days.
    pub token_ttl_days: i64,
    /// Signed file URL lifetime in seconds.
    pub url_ttl_secs: u64,
}

impl DeliveryConfig {
    /// | Env Var          | Default |
    /// |------------------|---------|
    /// | `MAX_DOWNLOADS`  | `5`     |
    /// | `TOKEN_TTL_DAYS` | `7`     |
    /// | `URL_TTL_SECS`   | `3600`  |
    pub fn from_env() -> Self {
        Self {
            max_downloads: env_parse("MAX_DOWNLOADS", 5),
            token_ttl_days: env_parse("TOKEN_TTL_DAYS", 7),
            url_ttl_secs: env_parse("URL_TTL_SECS", 3600),
        }
    }
}

/// Payment provider credentials, loaded separately from [`ServerConfig`]
/// because only the binary entrypoint needs them; tests inject gateway
/// doubles instead.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub paypal_webhook_id: String,
    /// `true` when `PAYPAL_MODE=live`; anything else targets the sandbox.
    pub paypal_live: bool,
}

impl PaymentConfig {
    /// | Env Var                 | Required | Default   |
    /// |-------------------------|----------|-----------|
    /// | `STRIPE_SECRET_KEY`     | **yes**  | --        |
    /// | `STRIPE_WEBHOOK_SECRET` | **yes**  | --        |
    /// | `PAYPAL_CLIENT_ID`      | **yes**  | --        |
    /// | `PAYPAL_CLIENT_SECRET`  | **yes**  | --        |
    /// | `PAYPAL_WEBHOOK_ID`     | **yes**  | --        |
    /// | `PAYPAL_MODE`           | no       | `sandbox` |
    ///
    /// # Panics
    ///
    /// Panics if any required variable is missing.
    pub fn from_env() -> Self {
        Self {
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .expect("STRIPE_SECRET_KEY must be set in the environment"),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
                .expect("STRIPE_WEBHOOK_SECRET must be set in the environment"),
            paypal_client_id: std::env::var("PAYPAL_CLIENT_ID")
                .expect("PAYPAL_CLIENT_ID must be set in the environment"),
            paypal_client_secret: std::env::var("PAYPAL_CLIENT_SECRET")
                .expect("PAYPAL_CLIENT_SECRET must be set in the environment"),
            paypal_webhook_id: std::env::var("PAYPAL_WEBHOOK_ID")
                .expect("PAYPAL_WEBHOOK_ID must be set in the environment"),
            paypal_live: std::env::var("PAYPAL_MODE").as_deref() == Ok("live"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must parse: {e:?}")),
        Err(_) => default,
    }
}
