//! Domain logic shared by every beatstore crate.
//!
//! Everything here is pure: no I/O, no database, no HTTP. The API and
//! repository layers depend on these types; nothing here depends on them.

pub mod document;
pub mod error;
pub mod license;
pub mod slug;
pub mod throttle;
pub mod token;
pub mod types;
pub mod validate;
