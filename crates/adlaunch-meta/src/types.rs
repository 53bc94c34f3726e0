//! Graph API wire types
//!
//! Serde shapes for the Graph endpoints the launch pipeline touches. These
//! stay private to the client where possible; the handful of session/status
//! structs crossing module boundaries are re-exported from the crate root.

use serde::Deserialize;
use std::collections::HashMap;

/// `{"error": {...}}` body returned on Graph API failures.
#[derive(Debug, Deserialize)]
pub struct GraphErrorBody {
    pub error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GraphErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub error_user_msg: Option<String>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

/// Response from `POST /{account}/adimages`; keyed by the uploaded filename.
#[derive(Debug, Deserialize)]
pub struct ImageUploadResponse {
    #[serde(default)]
    pub images: HashMap<String, UploadedImage>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedImage {
    pub hash: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Session handle for the remote-URL video upload protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUploadSession {
    pub video_id: String,
    pub upload_session_id: String,
}

/// Session handle for the resumable chunked video upload protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumableUploadSession {
    pub video_id: String,
    pub upload_url: String,
}

/// Server-confirmed progress of a resumable upload session.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UploadProgress {
    #[serde(default)]
    pub bytes_transferred: u64,
}

/// Processing state of an uploaded video, from `GET /{video_id}?fields=status`.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoProcessingStatus {
    pub status: VideoStatusField,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoStatusField {
    /// `ready`, `error`, `expired`, `processing`, ...
    pub video_status: String,
    #[serde(default)]
    pub processing_phase: Option<ProcessingPhase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingPhase {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<ProcessingError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl VideoProcessingStatus {
    /// Flatten the structured processing errors into one readable reason.
    pub fn error_reason(&self) -> String {
        let errors: Vec<String> = self
            .status
            .processing_phase
            .as_ref()
            .map(|phase| {
                phase
                    .errors
                    .iter()
                    .map(|e| match (e.code, e.message.as_deref()) {
                        (Some(code), Some(msg)) => format!("[{}] {}", code, msg),
                        (None, Some(msg)) => msg.to_string(),
                        (Some(code), None) => format!("error code {}", code),
                        (None, None) => "unspecified processing error".to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if errors.is_empty() {
            format!("video status '{}'", self.status.video_status)
        } else {
            format!(
                "video status '{}': {}",
                self.status.video_status,
                errors.join("; ")
            )
        }
    }
}

/// Ad-set read used to validate the publish target.
#[derive(Debug, Clone, Deserialize)]
pub struct AdSetInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
}

/// `{"id": "..."}` returned by object-creation endpoints.
#[derive(Debug, Deserialize)]
pub struct CreatedObject {
    pub id: String,
}

/// A page-backed Instagram account.
#[derive(Debug, Clone, Deserialize)]
pub struct PbiaAccount {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PbiaListResponse {
    #[serde(default)]
    pub data: Vec<PbiaAccount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_upload_response_keyed_by_filename() {
        let json = serde_json::json!({
            "images": {
                "hero_1x1.png": { "hash": "abc123", "url": "https://scontent/x" }
            }
        });
        let parsed: ImageUploadResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.images["hero_1x1.png"].hash, "abc123");
    }

    #[test]
    fn test_video_status_error_reason() {
        let json = serde_json::json!({
            "status": {
                "video_status": "error",
                "processing_phase": {
                    "status": "error",
                    "errors": [
                        { "code": 356, "message": "The video file is corrupt" }
                    ]
                }
            }
        });
        let parsed: VideoProcessingStatus = serde_json::from_value(json).unwrap();
        assert_eq!(
            parsed.error_reason(),
            "video status 'error': [356] The video file is corrupt"
        );
    }

    #[test]
    fn test_video_status_without_phase() {
        let json = serde_json::json!({ "status": { "video_status": "expired" } });
        let parsed: VideoProcessingStatus = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.error_reason(), "video status 'expired'");
    }
}
