//! Ad launch orchestrator
//!
//! One invocation per launch batch, strictly top-to-bottom: credentials are
//! resolved once, then every draft's assets are uploaded, then videos are
//! readiness-gated globally, then creatives are built and ads published per
//! draft, then statuses are persisted and one summary notification goes out.

pub mod assets;
pub mod credentials;
pub mod publisher;
pub mod report;
pub mod thumbnails;

use chrono::Utc;
use std::collections::BTreeSet;

use adlaunch_core::models::{AdDraft, DraftResult, DraftStatus, LaunchTotals};
use adlaunch_core::AppError;
use adlaunch_meta::{wait_for_videos, AssetUploader, RetryPolicy};

use crate::state::AppState;
use thumbnails::ThumbnailResolver;

/// Validated launch request parameters.
#[derive(Debug, Clone)]
pub struct LaunchParams {
    pub drafts: Vec<AdDraft>,
    pub brand_id: String,
    pub ad_account_id: String,
    pub fb_page_id: String,
    pub instagram_user_id: Option<String>,
}

/// Terminal outcome of a launch batch.
#[derive(Debug)]
pub struct LaunchOutcome {
    pub results: Vec<DraftResult>,
    pub totals: LaunchTotals,
}

/// Run one launch batch end to end. Batch-fatal errors (unknown brand,
/// credential problems) return `Err`; everything after credential
/// resolution lands in per-draft results.
pub async fn run_launch(state: &AppState, params: LaunchParams) -> Result<LaunchOutcome, AppError> {
    let brand = state
        .stores
        .brand_store
        .get_brand_token_info(&params.brand_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Brand {} not found", params.brand_id)))?;

    let access_token = credentials::decrypt_brand_token(&state.cipher, &brand, Utc::now())?;
    let api = state
        .graph_factory
        .client_for(&access_token)
        .map_err(|e| AppError::Internal(format!("failed to build Graph client: {}", e)))?;

    tracing::info!(
        brand_id = %params.brand_id,
        ad_account_id = %params.ad_account_id,
        drafts = params.drafts.len(),
        "Starting ad launch batch"
    );

    let actor = credentials::resolve_actor(
        api.as_ref(),
        state.stores.brand_store.as_ref(),
        &brand,
        &params.fb_page_id,
        params.instagram_user_id.as_deref(),
    )
    .await;

    // Batch start marker; failures here must not block the launch
    for draft in &params.drafts {
        if let Err(err) = state
            .stores
            .draft_store
            .update_status(&draft.id, DraftStatus::Uploading, None)
            .await
        {
            tracing::warn!(draft_id = %draft.id, error = %err, "Failed to mark draft as uploading");
        }
    }

    let retry = RetryPolicy::new(
        state.config.video_upload_max_attempts(),
        state.config.video_upload_retry_backoff(),
    );
    let uploader = AssetUploader::new(
        api.as_ref(),
        state.media_fetcher.as_ref(),
        retry,
        state.config.max_video_size_bytes(),
    );

    let mut batches = Vec::with_capacity(params.drafts.len());
    for draft in &params.drafts {
        let processed = assets::upload_draft_assets(&uploader, &params.ad_account_id, draft).await;
        batches.push(processed);
    }

    // Gate once over the unique video ids of the whole batch
    let video_ids: BTreeSet<String> = batches
        .iter()
        .flatten()
        .filter_map(|p| p.meta_video_id.clone())
        .collect();
    let readiness = wait_for_videos(
        api.as_ref(),
        &video_ids,
        state.config.video_poll_interval(),
        state.config.video_readiness_budget(),
    )
    .await;

    let resolver = ThumbnailResolver {
        api: api.as_ref(),
        fetcher: state.media_fetcher.as_ref(),
        draft_store: state.stores.draft_store.as_ref(),
        listing: state.object_listing.as_ref(),
        max_thumbnail_size_bytes: state.config.max_thumbnail_size_bytes(),
    };

    let mut outcomes: Vec<(String, DraftResult)> = Vec::with_capacity(params.drafts.len());
    for (draft, mut processed) in params.drafts.iter().zip(batches) {
        resolver
            .resolve_for_draft(
                &params.ad_account_id,
                &draft.id,
                &mut processed,
                &readiness.ready,
            )
            .await;

        let result = publisher::publish_draft(
            api.as_ref(),
            &params.ad_account_id,
            &actor,
            draft,
            &processed,
            &readiness,
        )
        .await;
        outcomes.push((draft.id.clone(), result));
    }

    report::persist_statuses(state.stores.draft_store.as_ref(), &outcomes).await;

    let results: Vec<DraftResult> = outcomes.into_iter().map(|(_, result)| result).collect();
    let summary = report::build_summary(&params.brand_id, &params.ad_account_id, results);
    report::send_summary(state.notifier.as_ref(), &summary).await;

    tracing::info!(
        total = summary.totals.total,
        successful = summary.totals.successful,
        uploaded = summary.totals.uploaded,
        failed = summary.totals.failed,
        "Ad launch batch finished"
    );

    Ok(LaunchOutcome {
        results: summary.results,
        totals: summary.totals,
    })
}
