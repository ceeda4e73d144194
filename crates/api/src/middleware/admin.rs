//! Session-cookie extractor for admin handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use beatstore_core::error::CoreError;

use crate::auth::session::{extract_session_token, validate_session_token, ROLE_ADMIN};
use crate::error::AppError;
use crate::state::AppState;

/// Requires a valid admin session cookie. Rejects with 401 otherwise; the
/// message never distinguishes a missing cookie from a bad one.
///
/// ```ignore
/// async fn admin_only(_admin: RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers)
            .ok_or(AppError::Core(CoreError::Unauthorized))?;

        let claims = validate_session_token(&token, &state.config.session)
            .map_err(|_| AppError::Core(CoreError::Unauthorized))?;

        if claims.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Unauthorized));
        }

        Ok(RequireAdmin)
    }
}
