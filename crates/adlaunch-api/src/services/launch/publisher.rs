//! Ad publishing and outcome classification
//!
//! Runs once per draft after uploads and the readiness gate: validate the
//! target ad-set, create the ad with the inline creative, and map the result
//! onto the draft lifecycle states. Drafts are fully independent.

use adlaunch_core::models::{AdDraft, DraftResult, DraftStatus};
use adlaunch_meta::{
    build_creative, classify_assets, ActorIdentity, CreateAdParams, GraphApi, GraphError,
    ProcessedAsset, ReadinessReport,
};

/// Invalid-parameter Graph error code.
const GRAPH_CODE_INVALID_PARAMETER: i64 = 100;

/// Error-text fragments that mark a configuration/validation problem. Used
/// only when the platform returned no structured code.
const CONFIGURATION_SIGNATURES: &[&str] = &[
    "regional regulation",
    "invalid parameter",
    "oauthexception",
    "failed to create",
    "payor",
    "beneficiary",
];

/// Whether a Graph failure points at the draft/account configuration rather
/// than a transient platform problem. Structured codes win; text signatures
/// are the fallback.
fn is_configuration_error(err: &GraphError) -> bool {
    if let Some(error_type) = err.api_error_type() {
        if error_type.eq_ignore_ascii_case("OAuthException") {
            return true;
        }
    }
    if err.api_code() == Some(GRAPH_CODE_INVALID_PARAMETER) {
        return true;
    }
    if err.api_subcode().is_some() && err.is_client_error() {
        // Subcoded 4xx failures (regional regulation, DSA payor/beneficiary)
        // are always configuration problems
        return true;
    }
    let text = err.to_string().to_lowercase();
    CONFIGURATION_SIGNATURES.iter().any(|sig| text.contains(sig))
}

/// Classify a publish failure into the terminal draft status.
fn classify_failure(err: &GraphError, any_uploaded: bool) -> DraftStatus {
    if is_configuration_error(err) {
        DraftStatus::Error
    } else if any_uploaded {
        // Assets survive for a manual retry
        DraftStatus::Uploaded
    } else {
        DraftStatus::Error
    }
}

/// Publish one draft. Always returns a terminal result carrying either an
/// `ad_id` or an `ad_error`.
pub async fn publish_draft(
    api: &dyn GraphApi,
    ad_account_id: &str,
    actor: &ActorIdentity,
    draft: &AdDraft,
    processed: &[ProcessedAsset],
    readiness: &ReadinessReport,
) -> DraftResult {
    let asset_results = processed.iter().map(ProcessedAsset::to_result).collect();
    let any_uploaded = processed.iter().any(ProcessedAsset::succeeded);

    let mut result = DraftResult {
        ad_name: draft.ad_name.clone(),
        status: DraftStatus::Error,
        assets: asset_results,
        campaign_id: draft.campaign_id.clone(),
        ad_set_id: draft.ad_set_id.clone(),
        ad_id: None,
        ad_error: None,
    };

    // All of this draft's videos must have cleared the readiness gate
    let draft_video_ids: Vec<String> = processed
        .iter()
        .filter_map(|p| p.meta_video_id.clone())
        .collect();
    if !readiness.contains_all_ready(&draft_video_ids) {
        let reason = readiness
            .failure_summary_for(&draft_video_ids)
            .unwrap_or_else(|| "video processing did not complete".to_string());
        tracing::warn!(draft_id = %draft.id, reason = %reason, "Draft blocked by video readiness");
        result.ad_error = Some(reason);
        return result;
    }

    let classified = classify_assets(processed);
    let creative = match build_creative(draft, &classified, actor) {
        Ok(creative) => creative,
        Err(err) => {
            let upload_errors: Vec<String> = processed
                .iter()
                .filter_map(|p| p.meta_upload_error.clone())
                .collect();
            let mut message = err.to_string();
            if !upload_errors.is_empty() {
                message = format!("{}: {}", message, upload_errors.join("; "));
            }
            result.ad_error = Some(message);
            return result;
        }
    };

    if let Err(err) = api.get_ad_set(&draft.ad_set_id).await {
        tracing::warn!(draft_id = %draft.id, ad_set_id = %draft.ad_set_id, error = %err, "Ad-set validation failed");
        result.status = classify_failure(&err, any_uploaded);
        result.ad_error = Some(format!("ad-set validation failed: {}", err));
        return result;
    }

    let params = CreateAdParams {
        name: draft.ad_name.clone(),
        ad_set_id: draft.ad_set_id.clone(),
        creative: creative.to_graph_json(),
        status: draft.requested_status.as_graph_str().to_string(),
    };
    match api.create_ad(ad_account_id, &params).await {
        Ok(ad_id) => {
            tracing::info!(draft_id = %draft.id, ad_id = %ad_id, "Ad published");
            result.status = DraftStatus::Published;
            result.ad_id = Some(ad_id);
        }
        Err(err) => {
            tracing::warn!(draft_id = %draft.id, error = %err, "Ad creation failed");
            result.status = classify_failure(&err, any_uploaded);
            result.ad_error = Some(format!("ad creation failed: {}", err));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_err(
        status: u16,
        message: &str,
        error_type: Option<&str>,
        code: Option<i64>,
        error_subcode: Option<i64>,
    ) -> GraphError {
        GraphError::Api {
            status,
            message: message.to_string(),
            error_type: error_type.map(String::from),
            code,
            error_subcode,
            fbtrace_id: None,
        }
    }

    #[test]
    fn test_structured_codes_trump_text() {
        let oauth = api_err(401, "Session expired", Some("OAuthException"), None, None);
        assert!(is_configuration_error(&oauth));

        let invalid = api_err(400, "some opaque message", None, Some(100), None);
        assert!(is_configuration_error(&invalid));

        let subcoded = api_err(400, "blocked", None, Some(368), Some(1885183));
        assert!(is_configuration_error(&subcoded));
    }

    #[test]
    fn test_text_signatures_as_fallback() {
        let regional = GraphError::Http {
            status: 400,
            body: "Ads to this region require compliance with Regional Regulations".to_string(),
        };
        assert!(is_configuration_error(&regional));

        let transient = GraphError::Http {
            status: 503,
            body: "service unavailable".to_string(),
        };
        assert!(!is_configuration_error(&transient));
    }

    #[test]
    fn test_classification_preserves_uploaded_assets() {
        let not_found = GraphError::Http {
            status: 404,
            body: "object does not exist".to_string(),
        };
        assert_eq!(classify_failure(&not_found, true), DraftStatus::Uploaded);
        assert_eq!(classify_failure(&not_found, false), DraftStatus::Error);

        let config = api_err(400, "bad", None, Some(100), None);
        assert_eq!(classify_failure(&config, true), DraftStatus::Error);
    }
}
