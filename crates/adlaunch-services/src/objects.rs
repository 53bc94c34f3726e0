//! Object storage listing for the thumbnail fallback search
//!
//! Authored media and thumbnails sit in a public bucket. When a draft asset
//! has no pre-associated thumbnail, the resolver lists the concept's folder
//! and matches by filename stem. Only the S3 list REST call is used, so a
//! plain HTTP client is enough.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// One listed object with its public URL.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Lists stored objects under a key prefix.
#[async_trait]
pub trait ObjectListing: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>>;
}

fn key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<Key>([^<]+)</Key>").expect("key regex is valid"))
}

/// Extract object keys from an S3 ListObjectsV2 XML body.
fn parse_listing_keys(xml: &str) -> Vec<String> {
    key_regex()
        .captures_iter(xml)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Public-bucket implementation using the unauthenticated list endpoint.
#[derive(Clone)]
pub struct PublicBucketListing {
    http_client: reqwest::Client,
    base_url: String,
}

impl PublicBucketListing {
    pub fn new(base_url: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client for object listing")?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ObjectListing for PublicBucketListing {
    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("list-type", "2"), ("prefix", prefix)])
            .send()
            .await
            .with_context(|| format!("Failed to list objects under {}", prefix))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Object listing returned {}", status));
        }
        let body = response.text().await.context("Failed to read listing body")?;

        Ok(parse_listing_keys(&body)
            .into_iter()
            .map(|key| StoredObject {
                url: format!("{}/{}", self.base_url, key),
                key,
            })
            .collect())
    }
}

/// Listing for deployments without a configured asset bucket. The thumbnail
/// fallback search simply finds nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopObjectListing;

#[async_trait]
impl ObjectListing for NoopObjectListing {
    async fn list(&self, _prefix: &str) -> Result<Vec<StoredObject>> {
        Ok(Vec::new())
    }
}
