//! Per-draft asset upload stage
//!
//! Assets are processed sequentially in source order to keep rate-limit
//! exposure predictable and error attribution simple.

use adlaunch_core::models::AdDraft;
use adlaunch_meta::{AssetUploader, ProcessedAsset};

/// Upload every asset of a draft. Individual failures are recorded on the
/// asset; the returned vector always has one entry per draft asset.
pub async fn upload_draft_assets(
    uploader: &AssetUploader<'_>,
    ad_account_id: &str,
    draft: &AdDraft,
) -> Vec<ProcessedAsset> {
    let mut processed = Vec::with_capacity(draft.assets.len());
    for asset in &draft.assets {
        tracing::info!(
            draft_id = %draft.id,
            asset = %asset.name,
            kind = %asset.kind,
            "Uploading draft asset"
        );
        processed.push(uploader.process_asset(ad_account_id, asset).await);
    }
    processed
}
