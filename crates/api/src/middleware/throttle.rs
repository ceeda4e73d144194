//! The rate/abuse guard, wired into handlers as extractors.
//!
//! Three independent per-IP buckets (general API, authentication, download
//! redemption) plus the login lockout counter. Handlers opt in by taking the
//! matching extractor as a parameter; an exhausted bucket rejects the
//! request before the handler body runs.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use beatstore_core::error::CoreError;
use beatstore_core::throttle::{LoginThrottle, RateLimiter};

use crate::config::GuardConfig;
use crate::error::AppError;
use crate::state::AppState;

/// All guard counters, shared process-wide through [`AppState`].
pub struct Guard {
    /// General API bucket.
    pub api: RateLimiter,
    /// Authentication bucket.
    pub auth: RateLimiter,
    /// Download redemption bucket.
    pub downloads: RateLimiter,
    /// Consecutive-failure login lockout.
    pub lockout: LoginThrottle,
}

impl Guard {
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            api: RateLimiter::new(config.api_limit, Duration::from_secs(config.api_window_secs)),
            auth: RateLimiter::new(
                config.auth_limit,
                Duration::from_secs(config.auth_window_secs),
            ),
            downloads: RateLimiter::new(
                config.download_limit,
                Duration::from_secs(config.download_window_secs),
            ),
            lockout: LoginThrottle::new(
                config.lockout_threshold,
                Duration::from_secs(config.lockout_secs),
            ),
        }
    }
}

/// Client IP for guard keying: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, else `"unknown"`. The service is expected to sit behind a
/// proxy that sets one of these.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real.is_empty() {
            return real.to_string();
        }
    }
    "unknown".to_string()
}

/// Consumes one point from the general API bucket. Carries the client IP.
pub struct ApiRate(pub String);

impl FromRequestParts<AppState> for ApiRate {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = client_ip(&parts.headers);
        if !state.guard.api.try_consume(&ip) {
            return Err(AppError::Core(CoreError::RateLimited));
        }
        Ok(ApiRate(ip))
    }
}

/// Authentication guard: the lockout is checked *before* the auth bucket is
/// consumed, so a locked-out client cannot drain anyone's bucket state.
pub struct AuthRate(pub String);

impl FromRequestParts<AppState> for AuthRate {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = client_ip(&parts.headers);
        if state.guard.lockout.is_locked(&ip) {
            return Err(AppError::Core(CoreError::LockedOut));
        }
        if !state.guard.auth.try_consume(&ip) {
            return Err(AppError::Core(CoreError::RateLimited));
        }
        Ok(AuthRate(ip))
    }
}

/// Consumes one point from the download bucket.
pub struct DownloadRate(pub String);

impl FromRequestParts<AppState> for DownloadRate {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ip = client_ip(&parts.headers);
        if !state.guard.downloads.try_consume(&ip) {
            return Err(AppError::Core(CoreError::RateLimited));
        }
        Ok(DownloadRate(ip))
    }
}
