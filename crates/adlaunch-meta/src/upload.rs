//! Asset uploader
//!
//! Pushes draft media to the platform: images as a single multipart POST,
//! videos through a two-path strategy (remote-URL ingestion first, resumable
//! chunked upload as fallback). Every failure is recorded on the asset and
//! never aborts sibling assets.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

use adlaunch_core::models::{AdDraftAsset, AssetKind, AssetResult};

use crate::client::GraphApi;
use crate::error::GraphError;
use crate::retry::{retry_with_policy, RetryPolicy};

const MIN_VIDEO_DIMENSION_PX: u32 = 120;
const KNOWN_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "avi", "mkv"];

/// Fetches source bytes for an asset from object storage.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Reqwest-backed fetcher for public asset URLs.
#[derive(Clone)]
pub struct HttpMediaFetcher {
    http_client: reqwest::Client,
}

impl HttpMediaFetcher {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client for media fetching")?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch media from {}", url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Fetching media from {} returned {}", url, status));
        }
        response
            .bytes()
            .await
            .with_context(|| format!("Failed to read media body from {}", url))
    }
}

/// An asset plus its transient upload outcome. Exactly one of `meta_hash`,
/// `meta_video_id`, or `meta_upload_error` is populated after processing.
#[derive(Debug, Clone)]
pub struct ProcessedAsset {
    pub asset: AdDraftAsset,
    pub meta_hash: Option<String>,
    pub meta_video_id: Option<String>,
    pub meta_upload_error: Option<String>,
    pub thumbnail_hash: Option<String>,
}

impl ProcessedAsset {
    pub fn succeeded(&self) -> bool {
        self.meta_upload_error.is_none()
            && (self.meta_hash.is_some() || self.meta_video_id.is_some())
    }

    pub fn is_video(&self) -> bool {
        self.asset.kind == AssetKind::Video
    }

    pub fn to_result(&self) -> AssetResult {
        AssetResult {
            name: self.asset.name.clone(),
            kind: self.asset.kind,
            meta_hash: self.meta_hash.clone(),
            meta_video_id: self.meta_video_id.clone(),
            meta_upload_error: self.meta_upload_error.clone(),
            thumbnail_hash: self.thumbnail_hash.clone(),
        }
    }
}

/// Uploads one batch's assets. Holds the token-bound Graph client for the
/// batch plus the retry policy and size ceiling from configuration.
pub struct AssetUploader<'a> {
    api: &'a dyn GraphApi,
    fetcher: &'a dyn MediaFetcher,
    retry: RetryPolicy,
    max_video_size_bytes: u64,
}

impl<'a> AssetUploader<'a> {
    pub fn new(
        api: &'a dyn GraphApi,
        fetcher: &'a dyn MediaFetcher,
        retry: RetryPolicy,
        max_video_size_bytes: u64,
    ) -> Self {
        Self {
            api,
            fetcher,
            retry,
            max_video_size_bytes,
        }
    }

    /// Upload one asset; failures land in `meta_upload_error` and never
    /// propagate.
    pub async fn process_asset(&self, ad_account_id: &str, asset: &AdDraftAsset) -> ProcessedAsset {
        let mut processed = ProcessedAsset {
            asset: asset.clone(),
            meta_hash: None,
            meta_video_id: None,
            meta_upload_error: None,
            thumbnail_hash: None,
        };

        match asset.kind {
            AssetKind::Image => match self.upload_image_asset(ad_account_id, asset).await {
                Ok(hash) => {
                    tracing::info!(asset = %asset.name, hash = %hash, "Image uploaded");
                    processed.meta_hash = Some(hash);
                }
                Err(err) => {
                    tracing::warn!(asset = %asset.name, error = %err, "Image upload failed");
                    processed.meta_upload_error = Some(err);
                }
            },
            AssetKind::Video => match self.upload_video_asset(ad_account_id, asset).await {
                Ok(video_id) => {
                    tracing::info!(asset = %asset.name, video_id = %video_id, "Video uploaded");
                    processed.meta_video_id = Some(video_id);
                }
                Err(err) => {
                    tracing::warn!(asset = %asset.name, error = %err, "Video upload failed");
                    processed.meta_upload_error = Some(err);
                }
            },
        }

        processed
    }

    async fn upload_image_asset(
        &self,
        ad_account_id: &str,
        asset: &AdDraftAsset,
    ) -> Result<String, String> {
        let bytes = self
            .fetcher
            .fetch(&asset.source_url)
            .await
            .map_err(|e| format!("failed to fetch image: {:#}", e))?;
        if bytes.is_empty() {
            return Err("downloaded image is empty".to_string());
        }
        self.api
            .upload_image(ad_account_id, &asset.name, bytes)
            .await
            .map_err(|e| format!("image upload failed: {}", e))
    }

    /// Remote-URL ingestion first; resumable chunked upload as fallback.
    /// Exhaustion reports both path errors so the caller sees the full story.
    async fn upload_video_asset(
        &self,
        ad_account_id: &str,
        asset: &AdDraftAsset,
    ) -> Result<String, String> {
        let remote_err = match self.upload_video_remote(ad_account_id, asset).await {
            Ok(video_id) => return Ok(video_id),
            Err(err) => {
                tracing::warn!(
                    asset = %asset.name,
                    error = %err,
                    "Remote-URL video upload failed, falling back to resumable upload"
                );
                err
            }
        };

        match self.upload_video_resumable(ad_account_id, asset).await {
            Ok(video_id) => Ok(video_id),
            Err(resumable_err) => Err(format!(
                "remote-url upload failed: {}; resumable upload failed: {}",
                remote_err, resumable_err
            )),
        }
    }

    /// Three-phase remote ingestion: the platform pulls the bytes itself.
    async fn upload_video_remote(
        &self,
        ad_account_id: &str,
        asset: &AdDraftAsset,
    ) -> Result<String, String> {
        let session = self
            .api
            .start_remote_video_upload(ad_account_id)
            .await
            .map_err(|e| format!("start phase failed: {}", e))?;
        self.api
            .transfer_remote_video(ad_account_id, &session, &asset.source_url)
            .await
            .map_err(|e| format!("transfer phase failed: {}", e))?;
        self.api
            .finish_remote_video_upload(ad_account_id, &session)
            .await
            .map_err(|e| format!("finish phase failed: {}", e))?;
        Ok(session.video_id)
    }

    /// Chunked upload with offset resume. Each attempt sends the remaining
    /// bytes from the server-confirmed offset; 4xx aborts, 5xx/transport
    /// retries after a fixed backoff.
    async fn upload_video_resumable(
        &self,
        ad_account_id: &str,
        asset: &AdDraftAsset,
    ) -> Result<String, String> {
        let bytes = self
            .fetcher
            .fetch(&asset.source_url)
            .await
            .map_err(|e| format!("failed to fetch video: {:#}", e))?;
        if bytes.is_empty() {
            return Err("downloaded video is empty".to_string());
        }
        let total = bytes.len() as u64;
        if total > self.max_video_size_bytes {
            return Err(format!(
                "video is {} bytes, exceeding the {} byte ceiling",
                total, self.max_video_size_bytes
            ));
        }

        warn_on_unexpected_extension(&asset.name);
        warn_on_low_filename_resolution(&asset.name);

        let session = self
            .api
            .start_resumable_video_upload(ad_account_id, total)
            .await
            .map_err(|e| format!("start phase failed: {}", e))?;

        let session_ref = &session;
        let api = self.api;
        let payload = bytes.clone();
        retry_with_policy(
            self.retry,
            "resumable video upload",
            |e: &GraphError| e.is_transient(),
            |attempt| {
                let payload = payload.clone();
                async move {
                    let offset = if attempt == 1 {
                        0
                    } else {
                        api.resumable_upload_status(session_ref)
                            .await?
                            .bytes_transferred
                            .min(total)
                    };
                    api.upload_video_chunk(session_ref, offset, payload.slice(offset as usize..))
                        .await
                }
            },
        )
        .await
        .map_err(|e| format!("chunk upload failed: {}", e))?;

        let progress = self
            .api
            .resumable_upload_status(&session)
            .await
            .map_err(|e| format!("post-upload status check failed: {}", e))?;
        if progress.bytes_transferred != total {
            return Err(format!(
                "server confirmed {} of {} bytes after upload",
                progress.bytes_transferred, total
            ));
        }

        self.api
            .finish_resumable_video_upload(ad_account_id, &session)
            .await
            .map_err(|e| format!("finish phase failed: {}", e))?;
        Ok(session.video_id)
    }
}

fn warn_on_unexpected_extension(filename: &str) {
    let extension = filename.rsplit('.').next().map(str::to_lowercase);
    match extension {
        Some(ext) if KNOWN_VIDEO_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            tracing::warn!(
                asset = filename,
                "Unexpected video file extension, uploading anyway"
            );
        }
    }
}

fn resolution_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,5})[xX](\d{1,5})").expect("resolution regex is valid"))
}

/// Warn when the filename declares a resolution below the minimum usable
/// dimension. Aspect-ratio tokens (`1x1`, `9x16`, ...) are not resolutions.
fn warn_on_low_filename_resolution(filename: &str) {
    const RATIO_TOKENS: &[(u32, u32)] = &[(1, 1), (4, 5), (9, 16), (16, 9)];
    for caps in resolution_token_regex().captures_iter(filename) {
        let (Ok(width), Ok(height)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            continue;
        };
        if RATIO_TOKENS.contains(&(width, height)) {
            continue;
        }
        if width.min(height) < MIN_VIDEO_DIMENSION_PX {
            tracing::warn!(
                asset = filename,
                width,
                height,
                "Filename declares a resolution below {}px, uploading anyway",
                MIN_VIDEO_DIMENSION_PX
            );
        }
    }
}
