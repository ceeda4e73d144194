//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Invariants that must hold under
//! concurrent requests (fulfillment idempotency, the download quota) are
//! enforced here with conditional UPDATEs, not in application code.

pub mod beat_repo;
pub mod order_repo;

pub use beat_repo::BeatRepo;
pub use order_repo::OrderRepo;
