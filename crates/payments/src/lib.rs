//! Payment provider adapters.
//!
//! Two back-ends implement the [`gateway::PaymentGateway`] capability: a
//! card-network style intent/capture provider ([`stripe`]) and a
//! redirect-capture provider ([`paypal`]). The checkout orchestrator only
//! ever calls `create`; the webhook and capture endpoints use the rest.

pub mod gateway;
pub mod paypal;
pub mod stripe;

pub use gateway::{CaptureOutcome, PaymentError, PaymentGateway, PaymentIntent, WebhookHeaders};
