//! Notification router — priority-gated delivery with quiet hours and
//! batch flushing.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alerts::{AlertLevel, ClassifiedAlert};
use crate::config::{NotifyConfig, QuietHoursConfig};
use crate::error::NotifyError;
use crate::metrics::{MetricKind, MetricRecord, MetricsSink};
use crate::notify::digest::{format_digest, render_alert};
use crate::notify::queue::AlertQueue;

/// Delivery mechanism the alert was sent through (wire format: delivery
/// mechanics belong to the collaborator, message shaping to the router).
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver one rendered message. Returns a bare success indicator.
    async fn send(&self, message: &str) -> bool;
}

/// Which path an alert took through the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryChannel {
    Immediate,
    Batch,
    QuietHours,
    /// P3 — logged only, never sent.
    Suppressed,
}

/// Outcome of routing one alert or flushing one queue.
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub success: bool,
    pub channel: DeliveryChannel,
    pub message_id: Option<Uuid>,
    pub error: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl DeliveryResult {
    fn queued(channel: DeliveryChannel) -> Self {
        Self {
            success: true,
            channel,
            message_id: None,
            error: None,
            delivered_at: None,
        }
    }
}

// ── Quiet hours ─────────────────────────────────────────────────────

/// Is `now` inside the configured quiet-hours window?
///
/// Start/end are "HH:MM" in the configured UTC offset. When start > end
/// the window wraps past midnight: in-window means current ≥ start OR
/// current < end. Otherwise in-window means start ≤ current < end, so
/// start == end is an empty window.
pub fn is_quiet_hours(
    config: &QuietHoursConfig,
    now: DateTime<Utc>,
) -> Result<bool, NotifyError> {
    let start = parse_hhmm(&config.start, config)?;
    let end = parse_hhmm(&config.end, config)?;
    let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
        NotifyError::InvalidWindow {
            start: config.start.clone(),
            end: config.end.clone(),
            reason: format!("invalid UTC offset {} minutes", config.utc_offset_minutes),
        }
    })?;
    let current = now.with_timezone(&offset).time();

    Ok(if start > end {
        current >= start || current < end
    } else {
        start <= current && current < end
    })
}

fn parse_hhmm(s: &str, config: &QuietHoursConfig) -> Result<NaiveTime, NotifyError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| NotifyError::InvalidWindow {
        start: config.start.clone(),
        end: config.end.clone(),
        reason: format!("cannot parse '{s}': {e}"),
    })
}

// ── Router ──────────────────────────────────────────────────────────

/// Routes classified alerts to immediate delivery, the quiet-hours queue,
/// or the P2 batch queue.
pub struct NotificationRouter {
    config: NotifyConfig,
    batch: AlertQueue,
    quiet: AlertQueue,
    metrics: Arc<dyn MetricsSink>,
}

impl NotificationRouter {
    pub fn new(config: NotifyConfig, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            config,
            batch: AlertQueue::new(),
            quiet: AlertQueue::new(),
            metrics,
        }
    }

    pub async fn batch_len(&self) -> usize {
        self.batch.len().await
    }

    pub async fn quiet_len(&self) -> usize {
        self.quiet.len().await
    }

    /// Route an alert according to its priority, evaluated at `Utc::now()`.
    pub async fn route_alert(
        &self,
        alert: ClassifiedAlert,
        sender: &dyn NotificationSender,
    ) -> DeliveryResult {
        self.route_alert_at(alert, sender, Utc::now()).await
    }

    /// Route an alert with an explicit clock, for deterministic testing
    /// of the quiet-hours gate.
    pub async fn route_alert_at(
        &self,
        alert: ClassifiedAlert,
        sender: &dyn NotificationSender,
        now: DateTime<Utc>,
    ) -> DeliveryResult {
        match alert.level {
            AlertLevel::P3 => {
                debug!(
                    source_id = %alert.source_id,
                    title = %alert.title,
                    "P3 alert suppressed (log only)"
                );
                DeliveryResult::queued(DeliveryChannel::Suppressed)
            }
            AlertLevel::P0 => {
                // Urgent — bypasses quiet hours entirely.
                self.send_now(&alert, sender).await
            }
            AlertLevel::P1 => {
                let quiet_now = match is_quiet_hours(&self.config.quiet_hours, now) {
                    Ok(quiet) => quiet,
                    Err(e) => {
                        warn!(error = %e, "Quiet-hours config invalid, treating as not quiet");
                        false
                    }
                };
                if quiet_now {
                    info!(
                        source_id = %alert.source_id,
                        "P1 alert deferred to quiet-hours queue"
                    );
                    self.quiet.push(alert, DeliveryChannel::QuietHours).await;
                    DeliveryResult::queued(DeliveryChannel::QuietHours)
                } else {
                    self.send_now(&alert, sender).await
                }
            }
            AlertLevel::P2 => {
                self.batch.push(alert, DeliveryChannel::Batch).await;
                DeliveryResult::queued(DeliveryChannel::Batch)
            }
        }
    }

    async fn send_now(
        &self,
        alert: &ClassifiedAlert,
        sender: &dyn NotificationSender,
    ) -> DeliveryResult {
        let message = render_alert(alert);
        self.deliver(&message, DeliveryChannel::Immediate, sender)
            .await
    }

    async fn deliver(
        &self,
        message: &str,
        channel: DeliveryChannel,
        sender: &dyn NotificationSender,
    ) -> DeliveryResult {
        let started = Instant::now();
        let success = sender.send(message).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        self.metrics.record(MetricRecord::new(
            MetricKind::Delivery,
            latency_ms,
            success,
            json!({"channel": channel}),
        ));

        if success {
            DeliveryResult {
                success: true,
                channel,
                message_id: Some(Uuid::new_v4()),
                error: None,
                delivered_at: Some(Utc::now()),
            }
        } else {
            warn!(?channel, "Notification send failed");
            DeliveryResult {
                success: false,
                channel,
                message_id: None,
                error: Some("send failed".into()),
                delivered_at: None,
            }
        }
    }

    /// Flush the P2 batch queue as a single digest message.
    ///
    /// The queue is swapped out before the send so a retry can never
    /// deliver the same alerts twice; a failed send restores the snapshot
    /// for the next flush cycle. An empty queue is a no-op success.
    pub async fn flush_p2_batch(&self, sender: &dyn NotificationSender) -> DeliveryResult {
        let snapshot = self.batch.drain_all().await;
        if snapshot.is_empty() {
            return DeliveryResult::queued(DeliveryChannel::Batch);
        }

        let digest = format_digest(&snapshot, self.config.digest_group_cap);
        let result = self.deliver(&digest, DeliveryChannel::Batch, sender).await;

        if !result.success {
            warn!(
                count = snapshot.len(),
                "Batch digest send failed, restoring queue"
            );
            self.batch.restore(snapshot).await;
        } else {
            info!(count = snapshot.len(), "Batch digest delivered");
        }
        result
    }

    /// Drain the quiet-hours queue: a queued-messages notice first, then
    /// each alert individually with a small inter-message delay. Each
    /// result is returned; one failure never blocks the rest. Alerts
    /// whose send fails go back on the queue for the next cycle.
    pub async fn flush_quiet_hours_queue(
        &self,
        sender: &dyn NotificationSender,
    ) -> Vec<DeliveryResult> {
        let snapshot = self.quiet.drain_all().await;
        if snapshot.is_empty() {
            return Vec::new();
        }

        info!(count = snapshot.len(), "Flushing quiet-hours queue");
        let notice = format!(
            "{} notification(s) were queued during quiet hours:",
            snapshot.len()
        );
        let mut results = vec![
            self.deliver(&notice, DeliveryChannel::QuietHours, sender)
                .await,
        ];

        let mut failed = Vec::new();
        for (i, item) in snapshot.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.inter_message_delay).await;
            }
            let message = render_alert(&item.alert);
            let result = self
                .deliver(&message, DeliveryChannel::QuietHours, sender)
                .await;
            if !result.success {
                failed.push(item);
            }
            results.push(result);
        }

        if !failed.is_empty() {
            warn!(
                count = failed.len(),
                "Quiet-hours sends failed, restoring for next flush"
            );
            self.quiet.restore(failed).await;
        }
        results
    }
}
