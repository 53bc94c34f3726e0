//! Status persistence and batch summary notification
//!
//! Every draft ends in exactly one terminal status with either an ad id or
//! an error message; those are written back to the store before the single
//! summary notification goes out. Notification delivery is best-effort.

use adlaunch_core::models::{DraftResult, LaunchSummary, LaunchTotals};
use adlaunch_db::DraftStore;
use adlaunch_services::NotificationSink;

/// Persist each draft's terminal status. Store failures are logged and do
/// not change the response the caller sees.
pub async fn persist_statuses(draft_store: &dyn DraftStore, outcomes: &[(String, DraftResult)]) {
    for (draft_id, result) in outcomes {
        if let Err(err) = draft_store
            .update_status(draft_id, result.status, result.ad_error.as_deref())
            .await
        {
            tracing::error!(
                draft_id = %draft_id,
                status = %result.status,
                error = %err,
                "Failed to persist draft status"
            );
        }
    }
}

/// Assemble the batch summary for the notification sink.
pub fn build_summary(
    brand_id: &str,
    ad_account_id: &str,
    results: Vec<DraftResult>,
) -> LaunchSummary {
    let mut campaign_ids: Vec<String> = results.iter().map(|r| r.campaign_id.clone()).collect();
    campaign_ids.sort();
    campaign_ids.dedup();
    let mut ad_set_ids: Vec<String> = results.iter().map(|r| r.ad_set_id.clone()).collect();
    ad_set_ids.sort();
    ad_set_ids.dedup();

    LaunchSummary {
        brand_id: brand_id.to_string(),
        batch_label: format!("{} draft(s)", results.len()),
        ad_account_id: ad_account_id.to_string(),
        campaign_ids,
        ad_set_ids,
        totals: LaunchTotals::from_results(&results),
        results,
    }
}

/// Fire-and-forget summary delivery.
pub async fn send_summary(notifier: &dyn NotificationSink, summary: &LaunchSummary) {
    if let Err(err) = notifier.send_launch_summary(summary).await {
        tracing::warn!(error = %err, "Failed to deliver launch summary notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlaunch_core::models::DraftStatus;

    #[test]
    fn test_summary_dedupes_target_ids() {
        let result = |ad_set: &str| DraftResult {
            ad_name: "ad".to_string(),
            status: DraftStatus::Published,
            assets: vec![],
            campaign_id: "c-1".to_string(),
            ad_set_id: ad_set.to_string(),
            ad_id: Some("ad-1".to_string()),
            ad_error: None,
        };
        let summary = build_summary("brand-1", "act_1", vec![result("as-1"), result("as-1"), result("as-2")]);
        assert_eq!(summary.campaign_ids, vec!["c-1".to_string()]);
        assert_eq!(summary.ad_set_ids, vec!["as-1".to_string(), "as-2".to_string()]);
        assert_eq!(summary.totals.total, 3);
        assert_eq!(summary.batch_label, "3 draft(s)");
    }
}
