use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cache entries prefixed with this marker are placeholders written while a
/// page-backed account creation is in flight elsewhere; they are treated as
/// absent when resolving the actor.
pub const PBIA_PLACEHOLDER_PREFIX: &str = "pending:";

/// Per-brand Meta credential bundle and actor-resolution settings.
///
/// The access token is stored AES-256-GCM encrypted with IV and auth tag as
/// separate fields. An ad is never published with a token past `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandTokenInfo {
    pub brand_id: String,
    pub access_token_enc: Option<String>,
    pub token_iv: Option<String>,
    pub token_auth_tag: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Brand default Instagram actor id, if a real account is linked
    pub instagram_actor_id: Option<String>,
    /// When true, ads post through a page-backed Instagram account (PBIA)
    pub use_page_actor: bool,
    /// Facebook page id -> page-backed Instagram account id
    #[serde(default)]
    pub pbia_cache: HashMap<String, String>,
}

impl BrandTokenInfo {
    /// Cached PBIA for a page, ignoring placeholder markers.
    pub fn cached_pbia(&self, page_id: &str) -> Option<&str> {
        self.pbia_cache
            .get(page_id)
            .map(String::as_str)
            .filter(|id| !id.starts_with(PBIA_PLACEHOLDER_PREFIX) && !id.is_empty())
    }

    /// Whether the stored token is expired at `now`. Missing expiry counts
    /// as expired: we never publish on a credential of unknown age.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= now,
            None => true,
        }
    }
}
