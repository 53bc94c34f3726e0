use super::{AssetKind, DraftStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-asset outcome returned to the caller. Upload-result fields are
/// transient: only the draft's aggregate status goes back into the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetResult {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_upload_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_hash: Option<String>,
}

/// Terminal outcome of one draft in a launch batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DraftResult {
    pub ad_name: String,
    pub status: DraftStatus,
    pub assets: Vec<AssetResult>,
    pub campaign_id: String,
    pub ad_set_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_error: Option<String>,
}

/// Batch totals for the response envelope and the notification sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct LaunchTotals {
    pub total: usize,
    pub successful: usize,
    pub uploaded: usize,
    pub failed: usize,
}

impl LaunchTotals {
    pub fn from_results(results: &[DraftResult]) -> Self {
        let successful = results
            .iter()
            .filter(|r| r.status == DraftStatus::Published)
            .count();
        let uploaded = results
            .iter()
            .filter(|r| r.status == DraftStatus::Uploaded)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == DraftStatus::Error)
            .count();
        Self {
            total: results.len(),
            successful,
            uploaded,
            failed,
        }
    }
}

/// Batch summary handed to the notification sink after status persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchSummary {
    pub brand_id: String,
    pub batch_label: String,
    pub ad_account_id: String,
    pub campaign_ids: Vec<String>,
    pub ad_set_ids: Vec<String>,
    pub results: Vec<DraftResult>,
    pub totals: LaunchTotals,
}
