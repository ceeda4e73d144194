//! Admin session handlers (login, logout).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;
use axum::Json;
use beatstore_core::error::CoreError;
use rand::Rng;
use serde::Deserialize;

use crate::auth::password::verify_password;
use crate::auth::session::{clear_session_cookie, issue_session_token, session_cookie};
use crate::error::{AppError, AppResult};
use crate::middleware::throttle::AuthRate;
use crate::state::AppState;

/// Request body for `POST /api/v1/auth/session`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// POST /api/v1/auth/session
///
/// Authenticate the single admin identity. On success, sets the session
/// cookie and resets the failure counter. Every failure answers the same
/// vague 401, bumps the lockout counter, and takes a randomized beat longer
/// to respond so timing does not separate unknown-user from wrong-password.
pub async fn login(
    AuthRate(ip): AuthRate,
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<(AppendHeaders<[(axum::http::HeaderName, String); 1]>, Json<serde_json::Value>)> {
    let (Some(username), Some(password)) = (input.username, input.password) else {
        return Err(AppError::Core(CoreError::Validation(
            "Username and password required".to_string(),
        )));
    };

    let username_ok = username == state.config.admin.username;
    let password_ok = match verify_password(&password, &state.config.admin.password_hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::error!(error = %e, "Password verification error");
            false
        }
    };

    if !(username_ok && password_ok) {
        state.guard.lockout.record_failure(&ip);
        failure_delay(&state).await;
        tracing::warn!(%ip, "Failed admin login");
        return Err(AppError::Core(CoreError::Unauthorized));
    }

    state.guard.lockout.clear(&ip);

    let token = issue_session_token(&state.config.session)
        .map_err(|e| AppError::InternalError(format!("Session token error: {e}")))?;
    let cookie = session_cookie(&token, state.config.session.ttl_hours);

    tracing::info!(%ip, "Admin logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "success": true })),
    ))
}

/// DELETE /api/v1/auth/session
///
/// Clear the session cookie. Always succeeds.
pub async fn logout(
) -> (AppendHeaders<[(axum::http::HeaderName, String); 1]>, Json<serde_json::Value>) {
    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(serde_json::json!({ "success": true })),
    )
}

/// Sleep for a randomized interval after a failed login. The configured
/// value bounds the delay; a third of it is the floor. Zero disables.
async fn failure_delay(state: &AppState) {
    let max_ms = state.config.guard.auth_failure_delay_ms;
    if max_ms == 0 {
        return;
    }
    let delay = rand::rng().random_range(max_ms / 3..=max_ms);
    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
}
