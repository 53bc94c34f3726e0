use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;

use adlaunch_core::models::BrandTokenInfo;
use adlaunch_core::AppError;

use crate::traits::BrandStore;

/// Repository for brand credential records
#[derive(Clone)]
pub struct BrandRepository {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct BrandRow {
    id: String,
    meta_access_token_enc: Option<String>,
    meta_token_iv: Option<String>,
    meta_token_auth_tag: Option<String>,
    meta_token_expires_at: Option<DateTime<Utc>>,
    instagram_actor_id: Option<String>,
    use_page_actor: Option<bool>,
    pbia_cache: Option<Json<HashMap<String, String>>>,
}

impl From<BrandRow> for BrandTokenInfo {
    fn from(row: BrandRow) -> Self {
        BrandTokenInfo {
            brand_id: row.id,
            access_token_enc: row.meta_access_token_enc,
            token_iv: row.meta_token_iv,
            token_auth_tag: row.meta_token_auth_tag,
            expires_at: row.meta_token_expires_at,
            instagram_actor_id: row.instagram_actor_id,
            use_page_actor: row.use_page_actor.unwrap_or(false),
            pbia_cache: row.pbia_cache.map(|Json(cache)| cache).unwrap_or_default(),
        }
    }
}

impl BrandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BrandStore for BrandRepository {
    async fn get_brand_token_info(
        &self,
        brand_id: &str,
    ) -> Result<Option<BrandTokenInfo>, AppError> {
        // Dynamic SQLx query so builds don't need DATABASE_URL/sqlx prepare
        let row = sqlx::query_as::<_, BrandRow>(
            r#"
            SELECT
                id, meta_access_token_enc, meta_token_iv, meta_token_auth_tag,
                meta_token_expires_at, instagram_actor_id,
                use_page_actor, pbia_cache
            FROM brands
            WHERE id = $1
            "#,
        )
        .bind(brand_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BrandTokenInfo::from))
    }

    async fn update_pbia_cache(
        &self,
        brand_id: &str,
        page_id: &str,
        instagram_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE brands
            SET pbia_cache = COALESCE(pbia_cache, '{}'::jsonb)
                || jsonb_build_object($2::text, $3::text),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(brand_id)
        .bind(page_id)
        .bind(instagram_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
