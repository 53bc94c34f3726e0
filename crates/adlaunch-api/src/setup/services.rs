//! Service and repository wiring

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;

use adlaunch_core::{Config, TokenCipher};
use adlaunch_db::{BrandRepository, DraftRepository};
use adlaunch_meta::{GraphClientFactory, GraphSettings, HttpMediaFetcher};
use adlaunch_services::{
    NoopNotificationSink, NoopObjectListing, NotificationSink, ObjectListing, PublicBucketListing,
    SlackNotifier,
};

use crate::state::{AppState, StoreState};

/// Build the application state from configuration and the database pool.
pub fn initialize_services(config: &Config, pool: PgPool) -> Result<AppState> {
    let cipher = TokenCipher::from_env().context("Failed to initialize token cipher")?;

    let stores = StoreState {
        brand_store: Arc::new(BrandRepository::new(pool.clone())),
        draft_store: Arc::new(DraftRepository::new(pool)),
    };

    let graph_factory = Arc::new(GraphClientFactory::new(GraphSettings::from_config(config)));
    let media_fetcher =
        Arc::new(HttpMediaFetcher::new().context("Failed to initialize media fetcher")?);

    let object_listing: Arc<dyn ObjectListing> = match config.asset_bucket_base_url() {
        Some(base_url) => Arc::new(
            PublicBucketListing::new(base_url.to_string())
                .context("Failed to initialize object listing")?,
        ),
        None => {
            tracing::warn!("ASSET_BUCKET_BASE_URL not set; thumbnail fallback search is disabled");
            Arc::new(NoopObjectListing)
        }
    };

    let notifier: Arc<dyn NotificationSink> = match config.slack_webhook_url() {
        Some(webhook_url) => Arc::new(
            SlackNotifier::new(webhook_url.to_string())
                .context("Failed to initialize Slack notifier")?,
        ),
        None => Arc::new(NoopNotificationSink),
    };

    Ok(AppState {
        config: config.clone(),
        cipher,
        stores,
        graph_factory,
        media_fetcher,
        object_listing,
        notifier,
    })
}
