//! Launch-ads endpoint
//!
//! Accepts a batch of drafts plus the brand/account/page identifiers and
//! runs the full launch pipeline. Partial failure is still a 200: every
//! draft's terminal outcome is in the response body.

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use adlaunch_core::models::{AdDraft, DraftResult, LaunchTotals};
use adlaunch_core::AppError;

use crate::error::{HttpAppError, ValidatedJson};
use crate::services::launch::{self, LaunchParams};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAdsRequest {
    pub drafts: Option<Vec<AdDraft>>,
    pub brand_id: Option<String>,
    pub ad_account_id: Option<String>,
    pub fb_page_id: Option<String>,
    #[serde(default)]
    pub instagram_user_id: Option<String>,
}

impl LaunchAdsRequest {
    /// Field-presence validation with a descriptive message per field.
    fn into_params(self) -> Result<LaunchParams, AppError> {
        let drafts = self
            .drafts
            .ok_or_else(|| AppError::InvalidInput("Missing required field: drafts".to_string()))?;
        if drafts.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one draft is required".to_string(),
            ));
        }
        let require = |value: Option<String>, field: &str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::InvalidInput(format!("Missing required field: {}", field)))
        };
        Ok(LaunchParams {
            drafts,
            brand_id: require(self.brand_id, "brandId")?,
            ad_account_id: require(self.ad_account_id, "adAccountId")?,
            fb_page_id: require(self.fb_page_id, "fbPageId")?,
            instagram_user_id: self.instagram_user_id,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LaunchAdsResponse {
    pub message: String,
    pub results: Vec<DraftResult>,
    pub summary: LaunchTotals,
}

/// Launch a batch of ad drafts
#[utoipa::path(
    post,
    path = "/api/v0/ads/launch",
    request_body = LaunchAdsRequest,
    responses(
        (status = 200, description = "Batch processed; per-draft outcomes in body", body = LaunchAdsResponse),
        (status = 400, description = "Missing or invalid request fields"),
        (status = 401, description = "Brand access token expired"),
        (status = 404, description = "Brand not found"),
        (status = 500, description = "Credential fetch or decryption failure")
    ),
    tag = "ads"
)]
pub async fn launch_ads(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LaunchAdsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let params = request.into_params().map_err(HttpAppError::from)?;
    let outcome = launch::run_launch(&state, params)
        .await
        .map_err(HttpAppError::from)?;

    let message = format!(
        "Processed {} draft(s): {} published, {} uploaded, {} failed",
        outcome.totals.total,
        outcome.totals.successful,
        outcome.totals.uploaded,
        outcome.totals.failed
    );
    Ok(Json(LaunchAdsResponse {
        message,
        results: outcome.results,
        summary: outcome.totals,
    }))
}
