//! Closed enumerations stored as TEXT columns.
//!
//! The schema backs each with a CHECK constraint; these enums are the only
//! place the literals are spelled in Rust.

use beatstore_core::error::CoreError;

/// Order lifecycle. PENDING is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "FAILED" => Ok(OrderStatus::Failed),
            other => Err(CoreError::Internal(format!(
                "Unknown order status in store: {other}"
            ))),
        }
    }
}

/// Which payment back-end an order went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
    Stripe,
    Paypal,
}

impl PaymentProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "STRIPE",
            PaymentProvider::Paypal => "PAYPAL",
        }
    }
}
