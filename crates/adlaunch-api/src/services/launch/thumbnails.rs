//! Thumbnail resolution for ready videos
//!
//! Certain creative layouts need a poster frame per video. The resolver
//! checks the persisted asset record first, then searches the asset's
//! storage folder for a sibling image with a matching filename stem. Every
//! failure here is non-fatal: the video ships without a custom poster.

use std::collections::BTreeSet;

use adlaunch_db::DraftStore;
use adlaunch_meta::{GraphApi, MediaFetcher, ProcessedAsset};
use adlaunch_services::ObjectListing;

const ACCEPTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub struct ThumbnailResolver<'a> {
    pub api: &'a dyn GraphApi,
    pub fetcher: &'a dyn MediaFetcher,
    pub draft_store: &'a dyn DraftStore,
    pub listing: &'a dyn ObjectListing,
    pub max_thumbnail_size_bytes: u64,
}

impl ThumbnailResolver<'_> {
    /// Attach thumbnail hashes to every ready video asset of a draft.
    pub async fn resolve_for_draft(
        &self,
        ad_account_id: &str,
        draft_id: &str,
        processed: &mut [ProcessedAsset],
        ready_videos: &BTreeSet<String>,
    ) {
        for item in processed.iter_mut() {
            let Some(video_id) = item.meta_video_id.as_deref() else {
                continue;
            };
            if !ready_videos.contains(video_id) {
                continue;
            }
            match self.resolve_one(ad_account_id, draft_id, item).await {
                Some(hash) => {
                    tracing::info!(asset = %item.asset.name, hash = %hash, "Thumbnail resolved");
                    item.thumbnail_hash = Some(hash);
                }
                None => {
                    tracing::debug!(asset = %item.asset.name, "No thumbnail found, continuing without poster frame");
                }
            }
        }
    }

    async fn resolve_one(
        &self,
        ad_account_id: &str,
        draft_id: &str,
        item: &ProcessedAsset,
    ) -> Option<String> {
        let url = match self
            .draft_store
            .asset_thumbnail_url(draft_id, &item.asset.name)
            .await
        {
            Ok(Some(url)) => Some(url),
            Ok(None) => self.search_sibling_thumbnail(&item.asset.source_url).await,
            Err(err) => {
                tracing::warn!(asset = %item.asset.name, error = %err, "Thumbnail lookup failed");
                self.search_sibling_thumbnail(&item.asset.source_url).await
            }
        }?;

        if !has_accepted_image_extension(&url) {
            tracing::warn!(asset = %item.asset.name, url = %url, "Thumbnail has unsupported image type, skipping");
            return None;
        }

        let bytes = match self.fetcher.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(asset = %item.asset.name, error = %err, "Failed to fetch thumbnail");
                return None;
            }
        };
        if bytes.is_empty() {
            tracing::warn!(asset = %item.asset.name, "Thumbnail is empty, skipping");
            return None;
        }
        if !looks_like_accepted_image(&bytes) {
            tracing::warn!(asset = %item.asset.name, url = %url, "Thumbnail bytes are not an accepted image format, skipping");
            return None;
        }
        if bytes.len() as u64 > self.max_thumbnail_size_bytes {
            tracing::warn!(
                asset = %item.asset.name,
                size = bytes.len(),
                limit = self.max_thumbnail_size_bytes,
                "Thumbnail exceeds size limit, skipping"
            );
            return None;
        }

        let upload_name = filename_of(&url).unwrap_or("thumbnail.jpg");
        match self.api.upload_image(ad_account_id, upload_name, bytes).await {
            Ok(hash) => Some(hash),
            Err(err) => {
                tracing::warn!(asset = %item.asset.name, error = %err, "Thumbnail upload failed");
                None
            }
        }
    }

    /// List the asset's folder and pick a sibling image whose filename
    /// starts with the video's stem.
    async fn search_sibling_thumbnail(&self, source_url: &str) -> Option<String> {
        let prefix = key_prefix_of(source_url)?;
        let filename = filename_of(source_url)?;
        let stem = stem_of(filename);

        let objects = match self.listing.list(&prefix).await {
            Ok(objects) => objects,
            Err(err) => {
                tracing::warn!(prefix = %prefix, error = %err, "Thumbnail folder listing failed");
                return None;
            }
        };

        let mut candidates: Vec<_> = objects
            .iter()
            .filter(|obj| {
                let Some(candidate) = filename_of(&obj.key) else {
                    return false;
                };
                candidate != filename
                    && stem_of(candidate).starts_with(stem)
                    && has_accepted_image_extension(candidate)
            })
            .collect();
        // Prefer explicitly named thumbnails over other stem matches
        candidates.sort_by_key(|obj| !obj.key.to_lowercase().contains("thumb"));
        candidates.first().map(|obj| obj.url.clone())
    }
}

/// Storage key prefix (directory part of the URL path) for a source URL.
fn key_prefix_of(source_url: &str) -> Option<String> {
    let after_scheme = source_url.split_once("://").map(|(_, rest)| rest)?;
    let (_, path) = after_scheme.split_once('/')?;
    let (dir, _) = path.rsplit_once('/')?;
    Some(format!("{}/", dir))
}

fn filename_of(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

fn stem_of(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(filename)
}

/// Magic-byte check on the fetched bytes; the URL extension can lie.
fn looks_like_accepted_image(bytes: &[u8]) -> bool {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return true; // JPEG
    }
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true; // PNG
    }
    // WEBP: RIFF container with a WEBP fourcc
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

fn has_accepted_image_extension(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| {
            let ext = ext.to_lowercase();
            ACCEPTED_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
