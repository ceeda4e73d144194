//! The delivery gateway: redeem a download token for signed file URLs.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use beatstore_core::error::CoreError;
use beatstore_core::license::LicenseTier;
use beatstore_core::slug::slugify;
use beatstore_db::models::status::OrderStatus;
use beatstore_db::repositories::OrderRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::throttle::DownloadRate;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response for `GET /api/v1/downloads/{token}`. Carries no internal ids.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub order: DownloadOrderInfo,
    pub downloads: Vec<DownloadItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOrderInfo {
    pub email: String,
    pub downloads_remaining: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadItem {
    pub title: String,
    pub license_type: String,
    pub files: Vec<DownloadFile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFile {
    pub format: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// GET /api/v1/downloads/{token}
///
/// Token checks run in a fixed order: existence, order completion, expiry,
/// then the quota claim. The claim is the only mutation and is atomic, so
/// concurrent redemptions of the same token cannot exceed the quota.
pub async fn redeem(
    _rate: DownloadRate,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<DownloadResponse>> {
    let order = OrderRepo::find_by_token(&state.pool, &token)
        .await?
        .ok_or(AppError::Core(CoreError::TokenNotFound))?;

    if OrderStatus::parse(&order.status)? != OrderStatus::Completed {
        return Err(AppError::Core(CoreError::Forbidden(
            "Order has not been completed".to_string(),
        )));
    }

    if chrono::Utc::now() > order.token_expires_at {
        return Err(AppError::Core(CoreError::Expired));
    }

    let download_count = OrderRepo::redeem_download(&state.pool, order.id)
        .await?
        .ok_or(AppError::Core(CoreError::QuotaExceeded))?;

    let url_ttl = Duration::from_secs(state.config.delivery.url_ttl_secs);
    let items = OrderRepo::items_with_beats(&state.pool, order.id).await?;

    let mut downloads = Vec::with_capacity(items.len());
    for item in items {
        let tier = LicenseTier::parse(&item.license_type)?;
        let basename = slugify(&item.beat_title);

        let mut files = vec![DownloadFile {
            format: "mp3".to_string(),
            url: presign(&state, &item.mp3_key, &format!("{basename}.mp3"), url_ttl).await?,
        }];
        if tier.delivers_lossless() {
            files.push(DownloadFile {
                format: "wav".to_string(),
                url: presign(&state, &item.wav_key, &format!("{basename}.wav"), url_ttl).await?,
            });
        }

        downloads.push(DownloadItem {
            title: item.beat_title,
            license_type: item.license_type,
            files,
        });
    }

    tracing::info!(
        download_count,
        max_downloads = order.max_downloads,
        "Download token redeemed"
    );

    Ok(Json(DownloadResponse {
        order: DownloadOrderInfo {
            email: order.email,
            downloads_remaining: order.max_downloads - download_count,
        },
        downloads,
    }))
}

async fn presign(
    state: &AppState,
    key: &str,
    filename: &str,
    ttl: Duration,
) -> AppResult<String> {
    state
        .blobs
        .presign_download(key, filename, ttl)
        .await
        .map_err(|e| AppError::InternalError(format!("Presigning failed: {e}")))
}
