//! HTTP handlers, one file per resource.

pub mod admin;
pub mod auth;
pub mod beats;
pub mod checkout;
pub mod downloads;
pub mod webhooks;
