//! Graph API client
//!
//! `GraphApi` is the seam between the launch pipeline and Meta: the
//! orchestrator only sees the trait, so tests substitute an in-memory fake.
//! `GraphClient` is the reqwest implementation, created once per batch with
//! the brand's decrypted access token.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use adlaunch_core::Config;

use crate::error::GraphError;
use crate::types::{
    AdSetInfo, CreatedObject, GraphErrorBody, ImageUploadResponse, PbiaAccount, PbiaListResponse,
    RemoteUploadSession, ResumableUploadSession, UploadProgress, VideoProcessingStatus,
};

const CLIENT_TIMEOUT_SECS: u64 = 300;
const ERROR_BODY_MAX_LEN: usize = 2048;

/// Parameters for the ad-creation call. The creative is pre-serialized by
/// the caller; the client only transports it.
#[derive(Debug, Clone)]
pub struct CreateAdParams {
    pub name: String,
    pub ad_set_id: String,
    pub creative: serde_json::Value,
    /// `ACTIVE` or `PAUSED`
    pub status: String,
}

/// Graph API operations the launch pipeline depends on.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Multipart image upload; returns the platform content hash.
    async fn upload_image(
        &self,
        ad_account_id: &str,
        filename: &str,
        bytes: Bytes,
    ) -> Result<String, GraphError>;

    /// Remote-URL video upload, phase 1: open a session.
    async fn start_remote_video_upload(
        &self,
        ad_account_id: &str,
    ) -> Result<RemoteUploadSession, GraphError>;

    /// Remote-URL video upload, phase 2: hand the platform the source URL.
    async fn transfer_remote_video(
        &self,
        ad_account_id: &str,
        session: &RemoteUploadSession,
        file_url: &str,
    ) -> Result<(), GraphError>;

    /// Remote-URL video upload, phase 3: close the session.
    async fn finish_remote_video_upload(
        &self,
        ad_account_id: &str,
        session: &RemoteUploadSession,
    ) -> Result<(), GraphError>;

    /// Resumable upload, phase 1: open a session with the declared size.
    async fn start_resumable_video_upload(
        &self,
        ad_account_id: &str,
        file_size: u64,
    ) -> Result<ResumableUploadSession, GraphError>;

    /// Resumable upload, phase 2: send bytes starting at `offset`.
    async fn upload_video_chunk(
        &self,
        session: &ResumableUploadSession,
        offset: u64,
        chunk: Bytes,
    ) -> Result<(), GraphError>;

    /// Server-confirmed byte count for a resumable session.
    async fn resumable_upload_status(
        &self,
        session: &ResumableUploadSession,
    ) -> Result<UploadProgress, GraphError>;

    /// Resumable upload, phase 3: close the session.
    async fn finish_resumable_video_upload(
        &self,
        ad_account_id: &str,
        session: &ResumableUploadSession,
    ) -> Result<(), GraphError>;

    /// Processing status of an uploaded video.
    async fn video_status(&self, video_id: &str) -> Result<VideoProcessingStatus, GraphError>;

    /// Read the target ad-set to validate it exists and is reachable.
    async fn get_ad_set(&self, ad_set_id: &str) -> Result<AdSetInfo, GraphError>;

    /// Create the ad; returns the new ad id.
    async fn create_ad(
        &self,
        ad_account_id: &str,
        params: &CreateAdParams,
    ) -> Result<String, GraphError>;

    /// Existing page-backed Instagram accounts for a page.
    async fn list_page_backed_accounts(
        &self,
        page_id: &str,
    ) -> Result<Vec<PbiaAccount>, GraphError>;

    /// Create a page-backed Instagram account for a page.
    async fn create_page_backed_account(&self, page_id: &str) -> Result<PbiaAccount, GraphError>;
}

/// Builds token-bound `GraphApi` clients. Tokens are per-brand and only
/// known once credentials resolve, so application state holds a factory
/// rather than a client.
pub trait GraphApiFactory: Send + Sync {
    fn client_for(&self, access_token: &str) -> Result<std::sync::Arc<dyn GraphApi>, GraphError>;
}

/// Production factory producing `GraphClient` instances.
#[derive(Debug, Clone)]
pub struct GraphClientFactory {
    settings: GraphSettings,
}

impl GraphClientFactory {
    pub fn new(settings: GraphSettings) -> Self {
        Self { settings }
    }
}

impl GraphApiFactory for GraphClientFactory {
    fn client_for(&self, access_token: &str) -> Result<std::sync::Arc<dyn GraphApi>, GraphError> {
        let client = GraphClient::new(self.settings.clone(), access_token.to_string())?;
        Ok(std::sync::Arc::new(client))
    }
}

/// Connection settings for the Graph API, taken from `Config`.
#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub base_url: String,
    pub upload_base_url: String,
    pub version: String,
}

impl GraphSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.graph_api_base_url().to_string(),
            upload_base_url: config.graph_upload_base_url().to_string(),
            version: config.graph_api_version().to_string(),
        }
    }
}

/// Reqwest-backed `GraphApi` implementation.
#[derive(Clone)]
pub struct GraphClient {
    http_client: reqwest::Client,
    settings: GraphSettings,
    access_token: String,
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token is redacted
        f.debug_struct("GraphClient")
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ResumableStartResponse {
    video_id: String,
    #[serde(default)]
    upload_url: Option<String>,
}

/// Cap a non-JSON error body for logging. The cut must land on a char
/// boundary or `String::truncate` panics on multibyte bodies.
fn truncate_error_body(mut body: String) -> String {
    if body.len() > ERROR_BODY_MAX_LEN {
        let mut end = ERROR_BODY_MAX_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

impl GraphClient {
    pub fn new(settings: GraphSettings, access_token: String) -> Result<Self, GraphError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GraphError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            settings,
            access_token,
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.base_url, self.settings.version, path
        )
    }

    fn account_path(ad_account_id: &str) -> String {
        if ad_account_id.starts_with("act_") {
            ad_account_id.to_string()
        } else {
            format!("act_{}", ad_account_id)
        }
    }

    /// Map a response to `T`, converting Graph error bodies into
    /// `GraphError::Api` and keeping the raw text for anything else.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GraphError> {
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            if let Ok(parsed) = serde_json::from_str::<GraphErrorBody>(&body) {
                let detail = parsed.error;
                return Err(GraphError::Api {
                    status,
                    message: detail
                        .message
                        .or(detail.error_user_msg)
                        .unwrap_or_else(|| "unknown Graph API error".to_string()),
                    error_type: detail.error_type,
                    code: detail.code,
                    error_subcode: detail.error_subcode,
                    fbtrace_id: detail.fbtrace_id,
                });
            }
            return Err(GraphError::Http {
                status,
                body: truncate_error_body(body),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            GraphError::InvalidResponse(format!("failed to decode response body: {}", e))
        })
    }

    /// POST a form to a versioned Graph path with the access token attached.
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, GraphError> {
        let mut params: Vec<(&str, String)> = form.to_vec();
        params.push(("access_token", self.access_token.clone()));

        let response = self
            .http_client
            .post(self.object_url(path))
            .form(&params)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_object<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Option<&str>,
    ) -> Result<T, GraphError> {
        let mut request = self
            .http_client
            .get(self.object_url(path))
            .query(&[("access_token", self.access_token.as_str())]);
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn upload_image(
        &self,
        ad_account_id: &str,
        filename: &str,
        bytes: Bytes,
    ) -> Result<String, GraphError> {
        let path = format!("{}/adimages", Self::account_path(ad_account_id));
        let part = multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let form = multipart::Form::new()
            .part("filename", part)
            .text("access_token", self.access_token.clone());

        let response = self
            .http_client
            .post(self.object_url(&path))
            .multipart(form)
            .send()
            .await?;
        let parsed: ImageUploadResponse = Self::parse_response(response).await?;

        // Keyed by filename; fall back to the single entry when the platform
        // rewrites the key.
        if let Some(image) = parsed.images.get(filename) {
            return Ok(image.hash.clone());
        }
        parsed
            .images
            .into_values()
            .next()
            .map(|image| image.hash)
            .ok_or_else(|| {
                GraphError::InvalidResponse("image upload response contained no images".to_string())
            })
    }

    async fn start_remote_video_upload(
        &self,
        ad_account_id: &str,
    ) -> Result<RemoteUploadSession, GraphError> {
        let path = format!("{}/advideos", Self::account_path(ad_account_id));
        self.post_form(
            &path,
            &[
                ("upload_phase", "start".to_string()),
                ("file_size", "0".to_string()),
            ],
        )
        .await
    }

    async fn transfer_remote_video(
        &self,
        ad_account_id: &str,
        session: &RemoteUploadSession,
        file_url: &str,
    ) -> Result<(), GraphError> {
        let path = format!("{}/advideos", Self::account_path(ad_account_id));
        let _: serde_json::Value = self
            .post_form(
                &path,
                &[
                    ("upload_phase", "transfer".to_string()),
                    ("upload_session_id", session.upload_session_id.clone()),
                    ("file_url", file_url.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn finish_remote_video_upload(
        &self,
        ad_account_id: &str,
        session: &RemoteUploadSession,
    ) -> Result<(), GraphError> {
        let path = format!("{}/advideos", Self::account_path(ad_account_id));
        let _: serde_json::Value = self
            .post_form(
                &path,
                &[
                    ("upload_phase", "finish".to_string()),
                    ("upload_session_id", session.upload_session_id.clone()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn start_resumable_video_upload(
        &self,
        ad_account_id: &str,
        file_size: u64,
    ) -> Result<ResumableUploadSession, GraphError> {
        let path = format!("{}/advideos", Self::account_path(ad_account_id));
        let started: ResumableStartResponse = self
            .post_form(
                &path,
                &[
                    ("upload_phase", "start".to_string()),
                    ("file_size", file_size.to_string()),
                ],
            )
            .await?;

        let upload_url = started.upload_url.unwrap_or_else(|| {
            format!(
                "{}/{}/{}",
                self.settings.upload_base_url, self.settings.version, started.video_id
            )
        });
        Ok(ResumableUploadSession {
            video_id: started.video_id,
            upload_url,
        })
    }

    async fn upload_video_chunk(
        &self,
        session: &ResumableUploadSession,
        offset: u64,
        chunk: Bytes,
    ) -> Result<(), GraphError> {
        let response = self
            .http_client
            .post(&session.upload_url)
            .header("Authorization", format!("OAuth {}", self.access_token))
            .header("offset", offset.to_string())
            .body(chunk)
            .send()
            .await?;
        let _: serde_json::Value = Self::parse_response(response).await?;
        Ok(())
    }

    async fn resumable_upload_status(
        &self,
        session: &ResumableUploadSession,
    ) -> Result<UploadProgress, GraphError> {
        let response = self
            .http_client
            .get(&session.upload_url)
            .header("Authorization", format!("OAuth {}", self.access_token))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn finish_resumable_video_upload(
        &self,
        ad_account_id: &str,
        session: &ResumableUploadSession,
    ) -> Result<(), GraphError> {
        let path = format!("{}/advideos", Self::account_path(ad_account_id));
        let _: serde_json::Value = self
            .post_form(
                &path,
                &[
                    ("upload_phase", "finish".to_string()),
                    ("video_id", session.video_id.clone()),
                ],
            )
            .await?;
        Ok(())
    }

    async fn video_status(&self, video_id: &str) -> Result<VideoProcessingStatus, GraphError> {
        self.get_object(video_id, Some("status")).await
    }

    async fn get_ad_set(&self, ad_set_id: &str) -> Result<AdSetInfo, GraphError> {
        self.get_object(ad_set_id, Some("id,name,campaign_id")).await
    }

    async fn create_ad(
        &self,
        ad_account_id: &str,
        params: &CreateAdParams,
    ) -> Result<String, GraphError> {
        let path = format!("{}/ads", Self::account_path(ad_account_id));
        let created: CreatedObject = self
            .post_form(
                &path,
                &[
                    ("name", params.name.clone()),
                    ("adset_id", params.ad_set_id.clone()),
                    ("creative", params.creative.to_string()),
                    ("status", params.status.clone()),
                ],
            )
            .await?;
        Ok(created.id)
    }

    async fn list_page_backed_accounts(
        &self,
        page_id: &str,
    ) -> Result<Vec<PbiaAccount>, GraphError> {
        let path = format!("{}/page_backed_instagram_accounts", page_id);
        let listed: PbiaListResponse = self.get_object(&path, None).await?;
        Ok(listed.data)
    }

    async fn create_page_backed_account(&self, page_id: &str) -> Result<PbiaAccount, GraphError> {
        let path = format!("{}/page_backed_instagram_accounts", page_id);
        self.post_form(&path, &[]).await
    }
}
