use async_trait::async_trait;
use sqlx::PgPool;

use adlaunch_core::models::DraftStatus;
use adlaunch_core::AppError;

use crate::traits::DraftStore;

/// Repository for draft lifecycle records
#[derive(Clone)]
pub struct DraftRepository {
    pool: PgPool,
}

impl DraftRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DraftStore for DraftRepository {
    async fn update_status(
        &self,
        draft_id: &str,
        status: DraftStatus,
        error: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE ad_drafts
            SET app_status = $2, error_message = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(draft_id)
        .bind(status.to_string())
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(draft_id, status = %status, "Status update matched no draft record");
        }
        Ok(())
    }

    async fn asset_thumbnail_url(
        &self,
        draft_id: &str,
        asset_name: &str,
    ) -> Result<Option<String>, AppError> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            r#"
            SELECT thumbnail_url
            FROM ad_draft_assets
            WHERE draft_id = $1 AND name = $2
            "#,
        )
        .bind(draft_id)
        .bind(asset_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(url,)| url).filter(|url| !url.is_empty()))
    }
}
