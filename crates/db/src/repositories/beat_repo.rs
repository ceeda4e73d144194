//! Repository for the `beats` table.

use beatstore_core::slug::{slugify, with_collision_suffix};
use beatstore_core::types::DbId;
use sqlx::PgPool;

use crate::models::beat::{Beat, BeatSummary, CreateBeat};

/// Column list for full `beats` rows.
const COLUMNS: &str = "\
    id, title, slug, bpm, musical_key, genre, tags, \
    price_cents, exclusive_price_cents, artwork_url, preview_url, \
    mp3_key, wav_key, duration_secs, plays, is_active, is_sold, created_at";

/// Column list for the public projection (no object keys).
const SUMMARY_COLUMNS: &str = "\
    id, title, slug, bpm, musical_key, genre, tags, \
    price_cents, exclusive_price_cents, artwork_url, preview_url, \
    duration_secs, plays, is_sold, created_at";

/// Catalog CRUD plus the sold/active flag mutations.
pub struct BeatRepo;

impl BeatRepo {
    /// Create a beat, deriving its slug from the title. A slug collision
    /// gets a millisecond-timestamp suffix; the unique constraint backs
    /// this up if two creations race.
    pub async fn create(pool: &PgPool, input: &CreateBeat) -> Result<Beat, sqlx::Error> {
        let base_slug = slugify(&input.title);
        let taken: Option<(DbId,)> = sqlx::query_as("SELECT id FROM beats WHERE slug = $1")
            .bind(&base_slug)
            .fetch_optional(pool)
            .await?;
        let slug = if taken.is_some() {
            with_collision_suffix(&base_slug, chrono::Utc::now().timestamp_millis())
        } else {
            base_slug
        };

        let query = format!(
            "INSERT INTO beats (title, slug, bpm, musical_key, genre, tags, \
                 price_cents, exclusive_price_cents, artwork_url, preview_url, \
                 mp3_key, wav_key, duration_secs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(&input.title)
            .bind(&slug)
            .bind(input.bpm)
            .bind(&input.musical_key)
            .bind(&input.genre)
            .bind(&input.tags)
            .bind(input.price_cents)
            .bind(input.exclusive_price_cents)
            .bind(&input.artwork_url)
            .bind(&input.preview_url)
            .bind(&input.mp3_key)
            .bind(&input.wav_key)
            .bind(input.duration_secs)
            .fetch_one(pool)
            .await
    }

    /// Public catalog listing: active beats, newest first, optionally
    /// filtered by a title/tag search term and a genre.
    pub async fn list_active(
        pool: &PgPool,
        q: Option<&str>,
        genre: Option<&str>,
    ) -> Result<Vec<BeatSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM beats \
             WHERE is_active = TRUE \
               AND ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%' OR LOWER($1) = ANY(tags)) \
               AND ($2::TEXT IS NULL OR genre ILIKE $2) \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, BeatSummary>(&query)
            .bind(q)
            .bind(genre)
            .fetch_all(pool)
            .await
    }

    /// Admin listing: every beat, active or not.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Beat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM beats ORDER BY created_at DESC");
        sqlx::query_as::<_, Beat>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Beat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM beats WHERE id = $1");
        sqlx::query_as::<_, Beat>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load the active beats among `ids`. Callers compare the result count
    /// against the distinct id count to detect unavailable items.
    pub async fn find_active_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<Beat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM beats WHERE id = ANY($1) AND is_active = TRUE"
        );
        sqlx::query_as::<_, Beat>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Soft-delete. Returns `false` when the beat does not exist.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE beats SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Bump the play counter. Returns `false` when the beat does not exist.
    pub async fn increment_plays(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE beats SET plays = plays + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Mark a beat as exclusively sold. Called by fulfillment for every
    /// EXCLUSIVE line item; idempotent by nature.
    pub async fn mark_sold(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE beats SET is_sold = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
