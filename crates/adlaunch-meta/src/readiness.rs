//! Video readiness gate
//!
//! After upload, videos process asynchronously on the platform. The gate
//! polls every video in the batch until all reach a terminal state or the
//! wall-clock budget runs out, and reports the outcome as explicit sets so
//! callers can name exactly which videos errored vs. timed out.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::client::GraphApi;

const STATUS_READY: &str = "ready";
const STATUS_ERROR: &str = "error";
const STATUS_EXPIRED: &str = "expired";

/// Outcome of one readiness wait over a set of video ids.
#[derive(Debug, Clone, Default)]
pub struct ReadinessReport {
    pub ready: BTreeSet<String>,
    /// Terminal failures with a human-readable reason per video
    pub errored: BTreeMap<String, String>,
    /// Still processing when the budget ran out
    pub pending: BTreeSet<String>,
}

impl ReadinessReport {
    pub fn all_ready(&self) -> bool {
        self.errored.is_empty() && self.pending.is_empty()
    }

    /// One-line failure description naming errored and still-processing
    /// videos, or `None` when everything is ready.
    pub fn failure_summary(&self) -> Option<String> {
        if self.all_ready() {
            return None;
        }
        let mut parts = Vec::new();
        if !self.errored.is_empty() {
            let errored: Vec<String> = self
                .errored
                .iter()
                .map(|(id, reason)| format!("{} ({})", id, reason))
                .collect();
            parts.push(format!("videos failed processing: {}", errored.join(", ")));
        }
        if !self.pending.is_empty() {
            let pending: Vec<&str> = self.pending.iter().map(String::as_str).collect();
            parts.push(format!(
                "videos still processing at timeout: {}",
                pending.join(", ")
            ));
        }
        Some(parts.join("; "))
    }

    /// Like `failure_summary`, restricted to `ids`. The gate waits on the
    /// whole batch at once; a caller reporting a single draft uses this so
    /// the message never names another draft's videos.
    pub fn failure_summary_for(&self, ids: &[String]) -> Option<String> {
        let scoped = ReadinessReport {
            ready: BTreeSet::new(),
            errored: self
                .errored
                .iter()
                .filter(|(id, _)| ids.contains(*id))
                .map(|(id, reason)| (id.clone(), reason.clone()))
                .collect(),
            pending: self
                .pending
                .iter()
                .filter(|id| ids.contains(*id))
                .cloned()
                .collect(),
        };
        scoped.failure_summary()
    }

    /// Whether every id in `ids` is in the ready set.
    pub fn contains_all_ready(&self, ids: &[String]) -> bool {
        ids.iter().all(|id| self.ready.contains(id))
    }
}

/// Poll `ids` every `interval` until all are terminal or `budget` elapses.
///
/// Status-call 4xx responses mark the video failed permanently; 5xx and
/// transport errors leave it pending for the next cycle.
pub async fn wait_for_videos(
    api: &dyn GraphApi,
    ids: &BTreeSet<String>,
    interval: Duration,
    budget: Duration,
) -> ReadinessReport {
    let mut report = ReadinessReport {
        pending: ids.clone(),
        ..Default::default()
    };
    if report.pending.is_empty() {
        return report;
    }

    let deadline = Instant::now() + budget;
    loop {
        let pending: Vec<String> = report.pending.iter().cloned().collect();
        for video_id in pending {
            match api.video_status(&video_id).await {
                Ok(status) => match status.status.video_status.as_str() {
                    STATUS_READY => {
                        report.pending.remove(&video_id);
                        report.ready.insert(video_id);
                    }
                    STATUS_ERROR | STATUS_EXPIRED => {
                        report.pending.remove(&video_id);
                        let reason = status.error_reason();
                        tracing::warn!(video_id = %video_id, reason = %reason, "Video processing failed");
                        report.errored.insert(video_id, reason);
                    }
                    other => {
                        tracing::debug!(video_id = %video_id, status = other, "Video still processing");
                    }
                },
                Err(err) if err.is_client_error() => {
                    report.pending.remove(&video_id);
                    tracing::warn!(video_id = %video_id, error = %err, "Video status check rejected");
                    report
                        .errored
                        .insert(video_id, format!("status check failed: {}", err));
                }
                Err(err) => {
                    // Transient; keep pending and retry next cycle
                    tracing::warn!(video_id = %video_id, error = %err, "Video status check failed, will retry");
                }
            }
        }

        if report.pending.is_empty() || Instant::now() >= deadline {
            break;
        }
        sleep(interval).await;
    }

    tracing::info!(
        ready = report.ready.len(),
        errored = report.errored.len(),
        pending = report.pending.len(),
        "Video readiness gate finished"
    );
    report
}
