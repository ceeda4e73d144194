use crate::types::DbId;

/// Domain error taxonomy.
///
/// The API layer maps each variant onto an HTTP status; see
/// `beatstore-api`'s `error` module for the exact mapping.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Bad input shape (missing fields, malformed email, unknown tier).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A requested beat is missing, deactivated, or exclusively sold.
    #[error("Unavailable item: {0}")]
    UnavailableItem(String),

    /// Unknown entity, addressed by internal id.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Unknown download token. Carries no identifying detail on purpose.
    #[error("Invalid download link")]
    TokenNotFound,

    /// The order exists but is not in a state that permits the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The download token is past its expiry window.
    #[error("Download link has expired")]
    Expired,

    /// The download quota for this order is exhausted.
    #[error("Maximum downloads reached")]
    QuotaExceeded,

    /// A per-IP token bucket ran dry.
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    /// Consecutive authentication failures triggered a lockout.
    #[error("Too many failed attempts. Try again later.")]
    LockedOut,

    /// Authentication failed. Intentionally does not say why.
    #[error("Invalid credentials")]
    Unauthorized,

    /// A payment provider call failed.
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// Anything else. Message is logged server-side, never sent to clients.
    #[error("Internal error: {0}")]
    Internal(String),
}
