use crate::aspect::{self, AspectRatio};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Media kind of a draft asset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetKind::Image => write!(f, "image"),
            AssetKind::Video => write!(f, "video"),
        }
    }
}

impl FromStr for AssetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(AssetKind::Image),
            "video" => Ok(AssetKind::Video),
            _ => Err(anyhow::anyhow!("Invalid asset kind: {}", s)),
        }
    }
}

/// Persisted draft lifecycle status (`app_status` on the draft record).
///
/// `Uploading` is written at batch start; every draft terminates in exactly
/// one of the other three. No retries across invocations - a failed draft is
/// resubmitted by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    Uploading,
    Published,
    Uploaded,
    Error,
}

impl Display for DraftStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DraftStatus::Uploading => write!(f, "UPLOADING"),
            DraftStatus::Published => write!(f, "PUBLISHED"),
            DraftStatus::Uploaded => write!(f, "UPLOADED"),
            DraftStatus::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for DraftStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPLOADING" => Ok(DraftStatus::Uploading),
            "PUBLISHED" => Ok(DraftStatus::Published),
            "UPLOADED" => Ok(DraftStatus::Uploaded),
            "ERROR" => Ok(DraftStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid draft status: {}", s)),
        }
    }
}

/// Requested delivery status for the created ad.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdDeliveryStatus {
    Active,
    #[default]
    Paused,
}

impl AdDeliveryStatus {
    pub fn as_graph_str(&self) -> &'static str {
        match self {
            AdDeliveryStatus::Active => "ACTIVE",
            AdDeliveryStatus::Paused => "PAUSED",
        }
    }
}

/// One media file attached to a draft, as authored in the UI.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdDraftAsset {
    /// Original filename, also the lookup key for stored asset metadata
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Public URL of the source bytes in object storage
    pub source_url: String,
    /// Explicit aspect-ratio tags from the authoring UI, e.g. `["9:16"]`
    #[serde(default)]
    pub aspect_ratios: Option<Vec<String>>,
}

impl AdDraftAsset {
    /// Resolve the asset's aspect ratio: explicit tags win, filename token
    /// detection is the fallback. `None` means undetermined (treated as feed).
    pub fn resolved_ratio(&self) -> Option<AspectRatio> {
        if let Some(tags) = &self.aspect_ratios {
            if let Some(ratio) = tags.iter().find_map(|t| AspectRatio::from_tag(t)) {
                return Some(ratio);
            }
        }
        aspect::detect_from_filename(&self.name)
    }
}

/// Optional site-link attachment on a draft.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteLink {
    #[serde(default)]
    pub site_link_title: String,
    #[serde(default)]
    pub site_link_url: String,
}

impl SiteLink {
    /// Only links with both title and URL are attached to the creative.
    pub fn is_complete(&self) -> bool {
        !self.site_link_title.trim().is_empty() && !self.site_link_url.trim().is_empty()
    }
}

/// One intended ad, authored locally and not yet published.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdDraft {
    /// Draft record id in the external store
    pub id: String,
    pub ad_name: String,
    pub campaign_id: String,
    pub ad_set_id: String,
    #[serde(default)]
    pub primary_text: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub destination_url: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub assets: Vec<AdDraftAsset>,
    #[serde(default)]
    pub site_links: Vec<SiteLink>,
    /// Advantage+ enhancement opt-ins, keyed by creative feature name;
    /// only keys present and truthy are forwarded
    #[serde(default)]
    pub advantage_plus: HashMap<String, bool>,
    #[serde(default)]
    pub requested_status: AdDeliveryStatus,
}
