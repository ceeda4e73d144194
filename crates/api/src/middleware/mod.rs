//! Request extractors: admin session enforcement and the rate/abuse guard.

pub mod admin;
pub mod throttle;
