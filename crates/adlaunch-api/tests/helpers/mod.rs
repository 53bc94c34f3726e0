//! Test helpers: build AppState and router over in-memory fakes.
//!
//! Run from workspace root: `cargo test -p adlaunch-api --test launch_test`.
//! No database or network is touched; every seam behind the orchestrator is
//! swapped for a fake defined here.

use anyhow::Result;
use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use adlaunch_api::setup::routes::setup_routes;
use adlaunch_api::state::{AppState, StoreState};
use adlaunch_core::models::{BrandTokenInfo, DraftStatus, LaunchSummary};
use adlaunch_core::{AppError, BaseConfig, Config, LaunchConfig, TokenCipher};
use adlaunch_db::{BrandStore, DraftStore};
use adlaunch_meta::types::{
    AdSetInfo, PbiaAccount, RemoteUploadSession, ResumableUploadSession, UploadProgress,
    VideoProcessingStatus, VideoStatusField,
};
use adlaunch_meta::{CreateAdParams, GraphApi, GraphApiFactory, GraphError, MediaFetcher};
use adlaunch_services::{NotificationSink, ObjectListing, StoredObject};

pub const TEST_KEY: [u8; 32] = [7u8; 32];

/// JPEG-prefixed payload so fetched media passes format sniffing.
pub const FAKE_JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake media bytes";

/// Recipe for a Graph failure the fake should serve.
#[derive(Debug, Clone)]
pub struct ErrSpec {
    pub status: u16,
    pub message: String,
    pub error_type: Option<String>,
    pub code: Option<i64>,
}

impl ErrSpec {
    pub fn http(status: u16, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            error_type: None,
            code: None,
        }
    }

    pub fn oauth(message: &str) -> Self {
        Self {
            status: 401,
            message: message.to_string(),
            error_type: Some("OAuthException".to_string()),
            code: Some(190),
        }
    }

    fn to_error(&self) -> GraphError {
        if self.error_type.is_some() || self.code.is_some() {
            GraphError::Api {
                status: self.status,
                message: self.message.clone(),
                error_type: self.error_type.clone(),
                code: self.code,
                error_subcode: None,
                fbtrace_id: None,
            }
        } else {
            GraphError::Http {
                status: self.status,
                body: self.message.clone(),
            }
        }
    }
}

/// In-memory Graph API. Video ids are handed out from a queue so tests can
/// pin processing statuses per id up front.
#[derive(Default)]
pub struct FakeGraph {
    pub calls: Mutex<Vec<String>>,
    /// Video ids popped by `start_remote_video_upload`, in order
    pub video_id_queue: Mutex<Vec<String>>,
    /// Processing status served per video id; missing means `processing`
    pub video_statuses: Mutex<HashMap<String, String>>,
    /// Ad-set reads that should fail, keyed by ad-set id
    pub ad_set_failures: Mutex<HashMap<String, ErrSpec>>,
    /// Ad creations that should fail, keyed by ad-set id
    pub create_ad_failures: Mutex<HashMap<String, ErrSpec>>,
    pub created_ads: Mutex<Vec<CreateAdParams>>,
    pub pbia_accounts: Mutex<Vec<PbiaAccount>>,
}

impl FakeGraph {
    pub fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    pub fn queue_video(&self, video_id: &str, status: &str) {
        self.video_id_queue
            .lock()
            .unwrap()
            .push(video_id.to_string());
        self.video_statuses
            .lock()
            .unwrap()
            .insert(video_id.to_string(), status.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphApi for FakeGraph {
    async fn upload_image(
        &self,
        _ad_account_id: &str,
        filename: &str,
        _bytes: Bytes,
    ) -> Result<String, GraphError> {
        self.record("upload_image");
        Ok(format!("hash-{}", filename))
    }

    async fn start_remote_video_upload(
        &self,
        _ad_account_id: &str,
    ) -> Result<RemoteUploadSession, GraphError> {
        self.record("start_remote_video_upload");
        let mut queue = self.video_id_queue.lock().unwrap();
        if queue.is_empty() {
            return Err(GraphError::Http {
                status: 500,
                body: "no video ids queued in fake".to_string(),
            });
        }
        let video_id = queue.remove(0);
        Ok(RemoteUploadSession {
            upload_session_id: format!("session-{}", video_id),
            video_id,
        })
    }

    async fn transfer_remote_video(
        &self,
        _ad_account_id: &str,
        _session: &RemoteUploadSession,
        _file_url: &str,
    ) -> Result<(), GraphError> {
        self.record("transfer_remote_video");
        Ok(())
    }

    async fn finish_remote_video_upload(
        &self,
        _ad_account_id: &str,
        _session: &RemoteUploadSession,
    ) -> Result<(), GraphError> {
        self.record("finish_remote_video_upload");
        Ok(())
    }

    async fn start_resumable_video_upload(
        &self,
        _ad_account_id: &str,
        _file_size: u64,
    ) -> Result<ResumableUploadSession, GraphError> {
        self.record("start_resumable_video_upload");
        Err(GraphError::Http {
            status: 500,
            body: "resumable path disabled in fake".to_string(),
        })
    }

    async fn upload_video_chunk(
        &self,
        _session: &ResumableUploadSession,
        _offset: u64,
        _chunk: Bytes,
    ) -> Result<(), GraphError> {
        self.record("upload_video_chunk");
        Ok(())
    }

    async fn resumable_upload_status(
        &self,
        _session: &ResumableUploadSession,
    ) -> Result<UploadProgress, GraphError> {
        self.record("resumable_upload_status");
        Ok(UploadProgress {
            bytes_transferred: 0,
        })
    }

    async fn finish_resumable_video_upload(
        &self,
        _ad_account_id: &str,
        _session: &ResumableUploadSession,
    ) -> Result<(), GraphError> {
        self.record("finish_resumable_video_upload");
        Ok(())
    }

    async fn video_status(&self, video_id: &str) -> Result<VideoProcessingStatus, GraphError> {
        self.record("video_status");
        let statuses = self.video_statuses.lock().unwrap();
        let status = statuses
            .get(video_id)
            .cloned()
            .unwrap_or_else(|| "processing".to_string());
        Ok(VideoProcessingStatus {
            status: VideoStatusField {
                video_status: status,
                processing_phase: None,
            },
        })
    }

    async fn get_ad_set(&self, ad_set_id: &str) -> Result<AdSetInfo, GraphError> {
        self.record("get_ad_set");
        if let Some(spec) = self.ad_set_failures.lock().unwrap().get(ad_set_id) {
            return Err(spec.to_error());
        }
        Ok(AdSetInfo {
            id: ad_set_id.to_string(),
            name: Some("Test Ad Set".to_string()),
            campaign_id: None,
        })
    }

    async fn create_ad(
        &self,
        _ad_account_id: &str,
        params: &CreateAdParams,
    ) -> Result<String, GraphError> {
        self.record("create_ad");
        if let Some(spec) = self.create_ad_failures.lock().unwrap().get(&params.ad_set_id) {
            return Err(spec.to_error());
        }
        let mut created = self.created_ads.lock().unwrap();
        created.push(params.clone());
        Ok(format!("ad-{}", created.len()))
    }

    async fn list_page_backed_accounts(
        &self,
        _page_id: &str,
    ) -> Result<Vec<PbiaAccount>, GraphError> {
        self.record("list_page_backed_accounts");
        Ok(self.pbia_accounts.lock().unwrap().clone())
    }

    async fn create_page_backed_account(&self, page_id: &str) -> Result<PbiaAccount, GraphError> {
        self.record("create_page_backed_account");
        Ok(PbiaAccount {
            id: format!("pbia-{}", page_id),
            username: None,
        })
    }
}

pub struct FakeFactory {
    pub api: Arc<FakeGraph>,
}

impl GraphApiFactory for FakeFactory {
    fn client_for(&self, _access_token: &str) -> Result<Arc<dyn GraphApi>, GraphError> {
        Ok(self.api.clone())
    }
}

#[derive(Default)]
pub struct FakeBrandStore {
    pub brands: Mutex<HashMap<String, BrandTokenInfo>>,
    pub pbia_writes: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl BrandStore for FakeBrandStore {
    async fn get_brand_token_info(
        &self,
        brand_id: &str,
    ) -> Result<Option<BrandTokenInfo>, AppError> {
        Ok(self.brands.lock().unwrap().get(brand_id).cloned())
    }

    async fn update_pbia_cache(
        &self,
        brand_id: &str,
        page_id: &str,
        instagram_id: &str,
    ) -> Result<(), AppError> {
        self.pbia_writes.lock().unwrap().push((
            brand_id.to_string(),
            page_id.to_string(),
            instagram_id.to_string(),
        ));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDraftStore {
    pub statuses: Mutex<Vec<(String, DraftStatus, Option<String>)>>,
    pub thumbnails: Mutex<HashMap<(String, String), String>>,
}

impl RecordingDraftStore {
    /// Last persisted status for a draft.
    pub fn final_status(&self, draft_id: &str) -> Option<(DraftStatus, Option<String>)> {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _, _)| id == draft_id)
            .map(|(_, status, error)| (*status, error.clone()))
    }
}

#[async_trait]
impl DraftStore for RecordingDraftStore {
    async fn update_status(
        &self,
        draft_id: &str,
        status: DraftStatus,
        error: Option<&str>,
    ) -> Result<(), AppError> {
        self.statuses.lock().unwrap().push((
            draft_id.to_string(),
            status,
            error.map(String::from),
        ));
        Ok(())
    }

    async fn asset_thumbnail_url(
        &self,
        draft_id: &str,
        asset_name: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(self
            .thumbnails
            .lock()
            .unwrap()
            .get(&(draft_id.to_string(), asset_name.to_string()))
            .cloned())
    }
}

pub struct StaticFetcher {
    pub bytes: Bytes,
}

#[async_trait]
impl MediaFetcher for StaticFetcher {
    async fn fetch(&self, _url: &str) -> Result<Bytes> {
        Ok(self.bytes.clone())
    }
}

pub struct EmptyListing;

#[async_trait]
impl ObjectListing for EmptyListing {
    async fn list(&self, _prefix: &str) -> Result<Vec<StoredObject>> {
        Ok(vec![])
    }
}

#[derive(Default)]
pub struct CollectingNotifier {
    pub summaries: Mutex<Vec<LaunchSummary>>,
}

#[async_trait]
impl NotificationSink for CollectingNotifier {
    async fn send_launch_summary(&self, summary: &LaunchSummary) -> Result<()> {
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }
}

/// Config with a short readiness budget so paused-clock tests finish fast.
pub fn test_config() -> Config {
    Config(Box::new(LaunchConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 5,
            environment: "test".to_string(),
        },
        database_url: "postgresql://unused".to_string(),
        graph_api_version: "v21.0".to_string(),
        graph_api_base_url: "https://graph.test.invalid".to_string(),
        graph_upload_base_url: "https://rupload.test.invalid".to_string(),
        video_poll_interval_secs: 1,
        video_readiness_budget_secs: 5,
        video_upload_max_attempts: 3,
        video_upload_retry_backoff_secs: 1,
        max_video_size_bytes: 10 * 1024 * 1024 * 1024,
        max_thumbnail_size_bytes: 30 * 1024 * 1024,
        asset_bucket_base_url: None,
        slack_webhook_url: None,
    }))
}

/// Test application: server plus handles onto every fake.
pub struct TestApp {
    pub server: TestServer,
    pub graph: Arc<FakeGraph>,
    pub brand_store: Arc<FakeBrandStore>,
    pub draft_store: Arc<RecordingDraftStore>,
    pub notifier: Arc<CollectingNotifier>,
}

pub fn cipher() -> TokenCipher {
    TokenCipher::from_key_bytes(&TEST_KEY).unwrap()
}

/// Brand record holding a valid encrypted token that expires in 30 days.
pub fn seeded_brand(brand_id: &str) -> BrandTokenInfo {
    let (ciphertext, iv, auth_tag) = cipher().encrypt_token("test-access-token").unwrap();
    BrandTokenInfo {
        brand_id: brand_id.to_string(),
        access_token_enc: Some(ciphertext),
        token_iv: Some(iv),
        token_auth_tag: Some(auth_tag),
        expires_at: Some(Utc::now() + ChronoDuration::days(30)),
        instagram_actor_id: None,
        use_page_actor: false,
        pbia_cache: HashMap::new(),
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with_media(Bytes::from_static(FAKE_JPEG))
}

/// Like `setup_test_app`, with the bytes the media fetcher serves pinned.
pub fn setup_test_app_with_media(media_bytes: Bytes) -> TestApp {
    let graph = Arc::new(FakeGraph::default());
    let brand_store = Arc::new(FakeBrandStore::default());
    let draft_store = Arc::new(RecordingDraftStore::default());
    let notifier = Arc::new(CollectingNotifier::default());

    let config = test_config();
    let state = AppState {
        config: config.clone(),
        cipher: cipher(),
        stores: StoreState {
            brand_store: brand_store.clone(),
            draft_store: draft_store.clone(),
        },
        graph_factory: Arc::new(FakeFactory { api: graph.clone() }),
        media_fetcher: Arc::new(StaticFetcher { bytes: media_bytes }),
        object_listing: Arc::new(EmptyListing),
        notifier: notifier.clone(),
    };

    let router = setup_routes(&config, state).expect("router builds");
    let server = TestServer::new(router).expect("test server builds");

    TestApp {
        server,
        graph,
        brand_store,
        draft_store,
        notifier,
    }
}

/// Minimal valid launch body with one image draft.
pub fn image_draft_body(brand_id: &str) -> serde_json::Value {
    serde_json::json!({
        "brandId": brand_id,
        "adAccountId": "123456",
        "fbPageId": "page-1",
        "drafts": [
            {
                "id": "draft-1",
                "adName": "Summer Sale",
                "campaignId": "c-1",
                "adSetId": "as-1",
                "primaryText": "Big summer sale",
                "headline": "Save now",
                "destinationUrl": "https://example.com/sale",
                "callToAction": "shop now",
                "assets": [
                    {
                        "name": "hero_1x1.png",
                        "type": "image",
                        "sourceUrl": "https://cdn.test.invalid/concepts/summer/hero_1x1.png"
                    }
                ]
            }
        ]
    })
}
