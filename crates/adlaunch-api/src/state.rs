//! Application state and sub-state extractors.
//!
//! Collaborators sit behind trait objects so the orchestrator and the
//! integration tests only ever see the seams. `Config` and `StoreState` are
//! extractable on their own via `FromRef`.

use axum::extract::FromRef;
use std::sync::Arc;

use adlaunch_core::{Config, TokenCipher};
use adlaunch_db::{BrandStore, DraftStore};
use adlaunch_meta::{GraphApiFactory, MediaFetcher};
use adlaunch_services::{NotificationSink, ObjectListing};

/// Brand and draft stores used by the launch pipeline.
#[derive(Clone)]
pub struct StoreState {
    pub brand_store: Arc<dyn BrandStore>,
    pub draft_store: Arc<dyn DraftStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cipher: TokenCipher,
    pub stores: StoreState,
    pub graph_factory: Arc<dyn GraphApiFactory>,
    pub media_fetcher: Arc<dyn MediaFetcher>,
    pub object_listing: Arc<dyn ObjectListing>,
    pub notifier: Arc<dyn NotificationSink>,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for StoreState {
    fn from_ref(state: &AppState) -> Self {
        state.stores.clone()
    }
}
