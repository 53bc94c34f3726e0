//! Batch summary notifications
//!
//! One summary message per launch batch goes to a Slack incoming webhook.
//! Delivery is fire-and-forget: the orchestrator logs failures and never
//! surfaces them to the caller.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use adlaunch_core::models::LaunchSummary;

/// Receives one batch summary after statuses are persisted.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_launch_summary(&self, summary: &LaunchSummary) -> Result<()>;
}

/// Render the summary as a Slack-friendly text block.
fn format_summary(summary: &LaunchSummary) -> String {
    let mut lines = vec![
        format!("Ad launch finished: {}", summary.batch_label),
        format!(
            "Brand {} / account {} — {} total, {} published, {} uploaded, {} failed",
            summary.brand_id,
            summary.ad_account_id,
            summary.totals.total,
            summary.totals.successful,
            summary.totals.uploaded,
            summary.totals.failed
        ),
    ];
    for result in &summary.results {
        let detail = match (&result.ad_id, &result.ad_error) {
            (Some(ad_id), _) => format!("ad {}", ad_id),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        lines.push(format!("• {} — {} {}", result.ad_name, result.status, detail));
    }
    lines.join("\n")
}

/// Slack incoming-webhook implementation.
#[derive(Clone)]
pub struct SlackNotifier {
    http_client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client for Slack notifications")?;
        Ok(Self {
            http_client,
            webhook_url,
        })
    }
}

#[async_trait]
impl NotificationSink for SlackNotifier {
    async fn send_launch_summary(&self, summary: &LaunchSummary) -> Result<()> {
        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(&json!({ "text": format_summary(summary) }))
            .send()
            .await
            .context("Failed to send Slack notification")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Slack webhook returned {}", status));
        }
        tracing::info!(batch = %summary.batch_label, "Launch summary notification sent");
        Ok(())
    }
}

/// Sink for deployments without a webhook configured.
#[derive(Debug, Clone, Default)]
pub struct NoopNotificationSink;

#[async_trait]
impl NotificationSink for NoopNotificationSink {
    async fn send_launch_summary(&self, summary: &LaunchSummary) -> Result<()> {
        tracing::debug!(batch = %summary.batch_label, "No notification sink configured, skipping summary");
        Ok(())
    }
}
