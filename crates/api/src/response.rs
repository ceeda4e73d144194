//! Shared response envelope types for API handlers.
//!
//! Admin responses use a `{ "data": ... }` envelope. The public storefront
//! endpoints (checkout, capture, downloads, catalog) keep the flat shapes
//! the storefront client consumes; those DTOs live next to their handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
