//! Credential resolution for a launch batch
//!
//! Decrypts the brand's stored access token and resolves the Instagram actor
//! identity ads will post through. Token problems are batch-fatal; actor
//! resolution always degrades to a Facebook-only identity.

use chrono::{DateTime, Utc};

use adlaunch_core::models::BrandTokenInfo;
use adlaunch_core::{AppError, TokenCipher};
use adlaunch_db::BrandStore;
use adlaunch_meta::{ActorIdentity, GraphApi};

/// Decrypt the brand's Meta access token. Rejects incomplete credential
/// records and expired tokens before touching the cipher.
pub fn decrypt_brand_token(
    cipher: &TokenCipher,
    brand: &BrandTokenInfo,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let (Some(ciphertext), Some(iv), Some(auth_tag)) = (
        brand.access_token_enc.as_deref(),
        brand.token_iv.as_deref(),
        brand.token_auth_tag.as_deref(),
    ) else {
        return Err(AppError::Encryption(format!(
            "brand {} credential record is missing encrypted token fields",
            brand.brand_id
        )));
    };

    if brand.is_expired(now) {
        let expiry = brand
            .expires_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "an unknown time".to_string());
        return Err(AppError::TokenExpired(format!(
            "Meta access token for brand {} expired at {}",
            brand.brand_id, expiry
        )));
    }

    cipher.decrypt_token(ciphertext, iv, auth_tag)
}

/// Resolve the Instagram actor for the batch.
///
/// With `use_page_actor` set, prefers a page-backed Instagram account:
/// cached mapping first, then listing, then creation. Any failure falls back
/// to the request-supplied id, then the brand default, then none. A freshly
/// discovered mapping is written back best-effort.
pub async fn resolve_actor(
    api: &dyn GraphApi,
    brand_store: &dyn BrandStore,
    brand: &BrandTokenInfo,
    page_id: &str,
    request_instagram_id: Option<&str>,
) -> ActorIdentity {
    let instagram_actor_id = if brand.use_page_actor {
        match resolve_page_backed_account(api, brand_store, brand, page_id).await {
            Some(id) => Some(id),
            None => fallback_instagram_id(brand, request_instagram_id),
        }
    } else {
        fallback_instagram_id(brand, request_instagram_id)
    };

    ActorIdentity {
        page_id: page_id.to_string(),
        instagram_actor_id,
    }
}

async fn resolve_page_backed_account(
    api: &dyn GraphApi,
    brand_store: &dyn BrandStore,
    brand: &BrandTokenInfo,
    page_id: &str,
) -> Option<String> {
    if let Some(cached) = brand.cached_pbia(page_id) {
        tracing::debug!(page_id, instagram_id = cached, "Using cached page-backed account");
        return Some(cached.to_string());
    }

    let resolved = match api.list_page_backed_accounts(page_id).await {
        Ok(accounts) if !accounts.is_empty() => Some(accounts[0].id.clone()),
        Ok(_) => match api.create_page_backed_account(page_id).await {
            Ok(account) => {
                tracing::info!(page_id, instagram_id = %account.id, "Created page-backed Instagram account");
                Some(account.id)
            }
            Err(err) => {
                tracing::warn!(page_id, error = %err, "Failed to create page-backed account");
                None
            }
        },
        Err(err) => {
            tracing::warn!(page_id, error = %err, "Failed to list page-backed accounts");
            None
        }
    };

    if let Some(instagram_id) = &resolved {
        // Best-effort cache write; a failure never aborts the batch
        if let Err(err) = brand_store
            .update_pbia_cache(&brand.brand_id, page_id, instagram_id)
            .await
        {
            tracing::warn!(
                brand_id = %brand.brand_id,
                page_id,
                error = %err,
                "Failed to persist page-backed account mapping"
            );
        }
    }

    resolved
}

fn fallback_instagram_id(
    brand: &BrandTokenInfo,
    request_instagram_id: Option<&str>,
) -> Option<String> {
    request_instagram_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .or_else(|| {
            brand
                .instagram_actor_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
        })
}
