//! Creative spec builder
//!
//! Partitions a draft's uploaded assets into feed and story groups, picks a
//! creative shape from the combination, and serializes to Graph JSON only at
//! the boundary. The shape selection matters: a lone 4:5 video pushed through
//! an asset feed without a feed rule defaults to story-only placement, and a
//! lone story video inside an asset feed trips a platform compatibility
//! issue, so it goes out as a direct object-story spec instead.

use serde_json::{json, Value};
use thiserror::Error;

use adlaunch_core::models::{AdDraft, SiteLink};
use adlaunch_core::{AspectRatio, Placement};

use crate::upload::ProcessedAsset;

const DEFAULT_CALL_TO_ACTION: &str = "LEARN_MORE";
const SITE_EXTENSIONS_FEATURE: &str = "site_extensions";

#[derive(Debug, Error)]
pub enum CreativeError {
    #[error("draft has no successfully uploaded assets")]
    NoUsableAssets,
}

/// A platform-side media reference produced by the uploader.
#[derive(Debug, Clone)]
pub enum UploadedMedia {
    Image {
        hash: String,
    },
    Video {
        video_id: String,
        thumbnail_hash: Option<String>,
    },
}

/// One uploaded asset with its resolved aspect ratio.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub name: String,
    pub media: UploadedMedia,
    pub ratio: Option<AspectRatio>,
}

impl UploadedAsset {
    pub fn is_video(&self) -> bool {
        matches!(self.media, UploadedMedia::Video { .. })
    }

    /// Undetermined ratios go to feed.
    fn placement(&self) -> Placement {
        self.ratio.map(|r| r.placement()).unwrap_or(Placement::Feed)
    }
}

/// Uploaded assets split by placement group.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedAssets {
    pub feed: Vec<UploadedAsset>,
    pub story: Vec<UploadedAsset>,
}

impl ClassifiedAssets {
    pub fn total(&self) -> usize {
        self.feed.len() + self.story.len()
    }
}

/// Keep only successfully uploaded assets and split them by placement.
pub fn classify_assets(processed: &[ProcessedAsset]) -> ClassifiedAssets {
    let mut classified = ClassifiedAssets::default();
    for item in processed.iter().filter(|p| p.succeeded()) {
        let media = if let Some(video_id) = &item.meta_video_id {
            UploadedMedia::Video {
                video_id: video_id.clone(),
                thumbnail_hash: item.thumbnail_hash.clone(),
            }
        } else if let Some(hash) = &item.meta_hash {
            UploadedMedia::Image { hash: hash.clone() }
        } else {
            continue;
        };
        let asset = UploadedAsset {
            name: item.asset.name.clone(),
            media,
            ratio: item.asset.resolved_ratio(),
        };
        match asset.placement() {
            Placement::Feed => classified.feed.push(asset),
            Placement::Story => classified.story.push(asset),
        }
    }
    classified
}

/// Shape of the creative payload.
#[derive(Debug, Clone)]
pub enum CreativeSpec {
    /// Direct object-story link/image spec
    SingleImage { image: UploadedAsset },
    /// Direct object-story video spec
    SingleVideo { video: UploadedAsset },
    /// Asset feed with per-placement customization rules
    AssetFeed {
        feed: Vec<UploadedAsset>,
        story: Vec<UploadedAsset>,
    },
}

/// Actor identities the creative posts through.
#[derive(Debug, Clone)]
pub struct ActorIdentity {
    pub page_id: String,
    pub instagram_actor_id: Option<String>,
}

impl ActorIdentity {
    /// Instagram actor only counts when non-empty after trimming.
    fn instagram(&self) -> Option<&str> {
        self.instagram_actor_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// A fully assembled creative, ready for boundary serialization.
#[derive(Debug, Clone)]
pub struct Creative {
    pub name: String,
    pub message: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub link: String,
    pub call_to_action: String,
    pub actor: ActorIdentity,
    pub site_links: Vec<SiteLink>,
    /// Advantage+ creative feature names to opt into
    pub enhancements: Vec<String>,
    pub spec: CreativeSpec,
}

/// Normalize a CTA string to the platform enum form.
pub fn normalize_call_to_action(raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(cta) => cta.to_uppercase().replace(' ', "_"),
        None => DEFAULT_CALL_TO_ACTION.to_string(),
    }
}

/// Pure shape selection from the classified assets.
fn select_spec(assets: &ClassifiedAssets) -> Result<CreativeSpec, CreativeError> {
    let feed_count = assets.feed.len();
    let story_count = assets.story.len();

    if assets.total() == 0 {
        return Err(CreativeError::NoUsableAssets);
    }

    if assets.total() == 1 {
        let only = assets
            .feed
            .first()
            .or_else(|| assets.story.first())
            .ok_or(CreativeError::NoUsableAssets)?;
        if !only.is_video() {
            return Ok(CreativeSpec::SingleImage {
                image: only.clone(),
            });
        }
        if story_count == 1 {
            // Single story video: the asset-feed form is dropped entirely
            return Ok(CreativeSpec::SingleVideo {
                video: only.clone(),
            });
        }
        // Single feed video still needs an explicit feed rule, otherwise
        // narrow ratios default to story-only placement
        return Ok(CreativeSpec::AssetFeed {
            feed: assets.feed.clone(),
            story: Vec::new(),
        });
    }

    tracing::debug!(feed_count, story_count, "Selecting asset-feed creative");
    Ok(CreativeSpec::AssetFeed {
        feed: assets.feed.clone(),
        story: assets.story.clone(),
    })
}

/// Assemble the creative for a draft from its classified uploads.
pub fn build_creative(
    draft: &AdDraft,
    assets: &ClassifiedAssets,
    actor: &ActorIdentity,
) -> Result<Creative, CreativeError> {
    let spec = select_spec(assets)?;

    let site_links: Vec<SiteLink> = draft
        .site_links
        .iter()
        .filter(|link| link.is_complete())
        .cloned()
        .collect();

    let mut enhancements: Vec<String> = draft
        .advantage_plus
        .iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(feature, _)| feature.clone())
        .collect();
    enhancements.sort();
    if !site_links.is_empty() && !enhancements.iter().any(|f| f == SITE_EXTENSIONS_FEATURE) {
        enhancements.push(SITE_EXTENSIONS_FEATURE.to_string());
    }

    Ok(Creative {
        name: format!("{} - Creative", draft.ad_name),
        message: draft.primary_text.clone(),
        headline: draft.headline.clone(),
        description: draft.description.clone(),
        link: draft.destination_url.clone().unwrap_or_default(),
        call_to_action: normalize_call_to_action(draft.call_to_action.as_deref()),
        actor: actor.clone(),
        site_links,
        enhancements,
        spec,
    })
}

impl Creative {
    /// Serialize to the Graph `creative` parameter shape.
    pub fn to_graph_json(&self) -> Value {
        let mut creative = json!({
            "name": self.name,
            "object_story_spec": self.object_story_spec(),
        });

        if let CreativeSpec::AssetFeed { feed, story } = &self.spec {
            creative["asset_feed_spec"] = self.asset_feed_spec(feed, story);
        }

        if !self.site_links.is_empty() {
            creative["site_links_spec"] = Value::Array(
                self.site_links
                    .iter()
                    .map(|link| {
                        json!({
                            "site_link_title": link.site_link_title,
                            "site_link_url": link.site_link_url,
                        })
                    })
                    .collect(),
            );
        }

        if !self.enhancements.is_empty() {
            let features: serde_json::Map<String, Value> = self
                .enhancements
                .iter()
                .map(|feature| {
                    (
                        feature.clone(),
                        json!({ "enhancement_type": "OPT_IN" }),
                    )
                })
                .collect();
            creative["degrees_of_freedom_spec"] =
                json!({ "creative_features_spec": Value::Object(features) });
        }

        creative
    }

    fn call_to_action_json(&self) -> Value {
        json!({
            "type": self.call_to_action,
            "value": { "link": self.link },
        })
    }

    fn object_story_spec(&self) -> Value {
        let mut spec = json!({ "page_id": self.actor.page_id });
        if let Some(instagram_id) = self.actor.instagram() {
            spec["instagram_user_id"] = json!(instagram_id);
        }

        match &self.spec {
            CreativeSpec::SingleImage { image } => {
                let hash = match &image.media {
                    UploadedMedia::Image { hash } => hash.as_str(),
                    // Images never carry video media
                    UploadedMedia::Video { .. } => "",
                };
                let mut link_data = json!({
                    "link": self.link,
                    "image_hash": hash,
                    "call_to_action": self.call_to_action_json(),
                });
                if let Some(message) = &self.message {
                    link_data["message"] = json!(message);
                }
                if let Some(headline) = &self.headline {
                    link_data["name"] = json!(headline);
                }
                if let Some(description) = &self.description {
                    link_data["description"] = json!(description);
                }
                spec["link_data"] = link_data;
            }
            CreativeSpec::SingleVideo { video } => {
                let (video_id, thumbnail_hash) = match &video.media {
                    UploadedMedia::Video {
                        video_id,
                        thumbnail_hash,
                    } => (video_id.as_str(), thumbnail_hash.as_deref()),
                    UploadedMedia::Image { .. } => ("", None),
                };
                let mut video_data = json!({
                    "video_id": video_id,
                    "call_to_action": self.call_to_action_json(),
                });
                if let Some(hash) = thumbnail_hash {
                    video_data["image_hash"] = json!(hash);
                }
                if let Some(message) = &self.message {
                    video_data["message"] = json!(message);
                }
                if let Some(headline) = &self.headline {
                    video_data["title"] = json!(headline);
                }
                if let Some(description) = &self.description {
                    video_data["link_description"] = json!(description);
                }
                spec["video_data"] = video_data;
            }
            // Media lives in asset_feed_spec; the story spec only names actors
            CreativeSpec::AssetFeed { .. } => {}
        }

        spec
    }

    fn asset_feed_spec(&self, feed: &[UploadedAsset], story: &[UploadedAsset]) -> Value {
        let mut images = Vec::new();
        let mut videos = Vec::new();
        let mut rules = Vec::new();
        let mut priority = 1u32;

        let mut push_asset = |asset: &UploadedAsset, placement: Placement| {
            let label = format!("{}_{}", asset.name, priority);
            match &asset.media {
                UploadedMedia::Image { hash } => {
                    images.push(json!({
                        "hash": hash,
                        "adlabels": [{ "name": label }],
                    }));
                }
                UploadedMedia::Video {
                    video_id,
                    thumbnail_hash,
                } => {
                    let mut video = json!({
                        "video_id": video_id,
                        "adlabels": [{ "name": label }],
                    });
                    if let Some(hash) = thumbnail_hash {
                        video["thumbnail_hash"] = json!(hash);
                    }
                    videos.push(video);
                }
            }

            let customization_spec = match placement {
                Placement::Feed => json!({
                    "publisher_platforms": ["facebook", "instagram"],
                    "facebook_positions": ["feed"],
                    "instagram_positions": ["stream", "explore"],
                }),
                Placement::Story => json!({
                    "publisher_platforms": ["facebook", "instagram"],
                    "facebook_positions": ["story"],
                    "instagram_positions": ["story"],
                }),
            };
            let label_key = if asset.is_video() {
                "video_label"
            } else {
                "image_label"
            };
            rules.push(json!({
                "customization_spec": customization_spec,
                label_key: { "name": label },
                "priority": priority,
            }));
            priority += 1;
        };

        for asset in feed {
            push_asset(asset, Placement::Feed);
        }
        for asset in story {
            push_asset(asset, Placement::Story);
        }

        let mut spec = json!({
            "images": images,
            "videos": videos,
            "link_urls": [{ "website_url": self.link }],
            "call_to_action_types": [self.call_to_action],
            "asset_customization_rules": rules,
        });
        if let Some(message) = &self.message {
            spec["bodies"] = json!([{ "text": message }]);
        }
        if let Some(headline) = &self.headline {
            spec["titles"] = json!([{ "text": headline }]);
        }
        if let Some(description) = &self.description {
            spec["descriptions"] = json!([{ "text": description }]);
        }
        spec
    }
}
