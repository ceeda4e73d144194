//! License tiers and the pricing rules attached to them.
//!
//! The [`quote`] function is the single source of truth for prices. Checkout
//! recomputes every line item through it and discards anything a client sent.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The three license tiers a beat can be sold under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseTier {
    Basic,
    Premium,
    Exclusive,
}

impl LicenseTier {
    /// The canonical wire/database spelling (`"BASIC"`, `"PREMIUM"`, `"EXCLUSIVE"`).
    pub fn as_str(self) -> &'static str {
        match self {
            LicenseTier::Basic => "BASIC",
            LicenseTier::Premium => "PREMIUM",
            LicenseTier::Exclusive => "EXCLUSIVE",
        }
    }

    /// Parse the canonical spelling. Anything else is a validation error.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "BASIC" => Ok(LicenseTier::Basic),
            "PREMIUM" => Ok(LicenseTier::Premium),
            "EXCLUSIVE" => Ok(LicenseTier::Exclusive),
            other => Err(CoreError::Validation(format!(
                "Unknown license type: {other}"
            ))),
        }
    }

    /// Premium and exclusive buyers receive the lossless WAV in addition to
    /// the compressed MP3.
    pub fn delivers_lossless(self) -> bool {
        matches!(self, LicenseTier::Premium | LicenseTier::Exclusive)
    }
}

impl std::fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price multiplier applied to the base price for a PREMIUM lease.
const PREMIUM_MULTIPLIER: i64 = 2;

/// Fallback multiplier for an EXCLUSIVE sale when no override price is set.
const EXCLUSIVE_FALLBACK_MULTIPLIER: i64 = 10;

/// Authoritative price of one line item, in cents.
///
/// BASIC sells at the base price, PREMIUM at twice the base price, and
/// EXCLUSIVE at the beat's override price when one is set, otherwise ten
/// times the base price.
pub fn quote(base_price_cents: i64, exclusive_price_cents: Option<i64>, tier: LicenseTier) -> i64 {
    match tier {
        LicenseTier::Basic => base_price_cents,
        LicenseTier::Premium => base_price_cents * PREMIUM_MULTIPLIER,
        LicenseTier::Exclusive => {
            exclusive_price_cents.unwrap_or(base_price_cents * EXCLUSIVE_FALLBACK_MULTIPLIER)
        }
    }
}
