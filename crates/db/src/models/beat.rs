//! Beat entity models and DTOs.

use beatstore_core::license::{quote, LicenseTier};
use beatstore_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `beats` table. Carries the blob store object keys, so this
/// struct must never be serialized into a public response; use
/// [`BeatSummary`] for that.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Beat {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub bpm: i32,
    pub musical_key: String,
    pub genre: String,
    pub tags: Vec<String>,
    pub price_cents: i64,
    pub exclusive_price_cents: Option<i64>,
    pub artwork_url: Option<String>,
    pub preview_url: Option<String>,
    pub mp3_key: String,
    pub wav_key: String,
    pub duration_secs: Option<i32>,
    pub plays: i64,
    pub is_active: bool,
    pub is_sold: bool,
    pub created_at: Timestamp,
}

impl Beat {
    /// Authoritative price of this beat under `tier`, in cents.
    pub fn price_for(&self, tier: LicenseTier) -> i64 {
        quote(self.price_cents, self.exclusive_price_cents, tier)
    }
}

/// Public catalog projection: everything a browsing client may see, and
/// nothing it may not (no object keys).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BeatSummary {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub bpm: i32,
    pub musical_key: String,
    pub genre: String,
    pub tags: Vec<String>,
    pub price_cents: i64,
    pub exclusive_price_cents: Option<i64>,
    pub artwork_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration_secs: Option<i32>,
    pub plays: i64,
    pub is_sold: bool,
    pub created_at: Timestamp,
}

/// DTO for creating a beat via `POST /api/v1/admin/beats`.
#[derive(Debug, Deserialize)]
pub struct CreateBeat {
    pub title: String,
    pub bpm: i32,
    pub musical_key: String,
    pub genre: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price_cents: i64,
    pub exclusive_price_cents: Option<i64>,
    pub artwork_url: Option<String>,
    pub preview_url: Option<String>,
    pub mp3_key: String,
    pub wav_key: String,
    pub duration_secs: Option<i32>,
}

/// Query parameters for `GET /api/v1/beats`.
#[derive(Debug, Deserialize)]
pub struct BeatListQuery {
    /// Case-insensitive title substring or exact tag match.
    pub q: Option<String>,
    /// Case-insensitive genre match.
    pub genre: Option<String>,
}
