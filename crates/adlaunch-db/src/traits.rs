//! Store traits consumed by the launch pipeline
//!
//! The orchestrator only sees these traits; the Postgres repositories in
//! `db/` implement them, and tests substitute in-memory fakes.

use async_trait::async_trait;

use adlaunch_core::models::{BrandTokenInfo, DraftStatus};
use adlaunch_core::AppError;

/// Brand credential records.
#[async_trait]
pub trait BrandStore: Send + Sync {
    /// Fetch the credential bundle for a brand, or `None` when unknown.
    async fn get_brand_token_info(
        &self,
        brand_id: &str,
    ) -> Result<Option<BrandTokenInfo>, AppError>;

    /// Record a page-backed Instagram account mapping. Callers treat
    /// failures as best-effort.
    async fn update_pbia_cache(
        &self,
        brand_id: &str,
        page_id: &str,
        instagram_id: &str,
    ) -> Result<(), AppError>;
}

/// Draft lifecycle records.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Persist a draft's lifecycle status and optional error message.
    async fn update_status(
        &self,
        draft_id: &str,
        status: DraftStatus,
        error: Option<&str>,
    ) -> Result<(), AppError>;

    /// Pre-associated thumbnail URL for a draft asset, if one was stored.
    async fn asset_thumbnail_url(
        &self,
        draft_id: &str,
        asset_name: &str,
    ) -> Result<Option<String>, AppError>;
}
