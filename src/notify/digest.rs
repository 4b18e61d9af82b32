//! Message rendering for alerts and batch digests.

use crate::alerts::{AlertSource, ClassifiedAlert};
use crate::notify::queue::QueuedNotification;

/// Render a single alert for delivery, including the fired signals so
/// the user can see why it surfaced.
pub fn render_alert(alert: &ClassifiedAlert) -> String {
    let mut message = format!("[{}] {}", alert.level, alert.title);
    if !alert.body.is_empty() {
        message.push_str(&format!("\n{}", alert.body));
    }
    if !alert.signals.is_empty() {
        message.push_str(&format!("\n({})", alert.signals.join(", ")));
    }
    message
}

/// Render a batch digest grouping alerts by source kind, showing at most
/// `group_cap` items per group with an "...and N more" suffix.
pub fn format_digest(items: &[QueuedNotification], group_cap: usize) -> String {
    let mut message = format!("Notification digest ({} items)\n", items.len());

    for source in [AlertSource::Email, AlertSource::Calendar] {
        let group: Vec<&QueuedNotification> = items
            .iter()
            .filter(|item| item.alert.source == source)
            .collect();
        if group.is_empty() {
            continue;
        }

        message.push_str(&format!("\n{} ({}):\n", source.as_str(), group.len()));
        for item in group.iter().take(group_cap) {
            message.push_str(&format!(
                "- [{}] {}\n",
                item.alert.level, item.alert.title
            ));
        }
        if group.len() > group_cap {
            message.push_str(&format!("  ...and {} more\n", group.len() - group_cap));
        }
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertLevel;
    use crate::notify::router::DeliveryChannel;
    use chrono::Utc;

    fn queued(source: AlertSource, title: &str) -> QueuedNotification {
        QueuedNotification {
            alert: ClassifiedAlert {
                level: AlertLevel::P2,
                title: title.into(),
                body: String::new(),
                source,
                source_id: "id".into(),
                signals: vec![],
                timestamp: Utc::now(),
                metadata: serde_json::Value::Null,
            },
            queued_at: Utc::now(),
            channel: DeliveryChannel::Batch,
        }
    }

    #[test]
    fn render_includes_level_title_and_signals() {
        let mut alert = queued(AlertSource::Email, "Standup moved").alert;
        alert.level = AlertLevel::P1;
        alert.body = "now at 10:30".into();
        alert.signals = vec!["starts within 24 hours".into()];

        let message = render_alert(&alert);
        assert!(message.contains("[P1]"));
        assert!(message.contains("Standup moved"));
        assert!(message.contains("now at 10:30"));
        assert!(message.contains("starts within 24 hours"));
    }

    #[test]
    fn digest_groups_by_source() {
        let items = vec![
            queued(AlertSource::Email, "mail-1"),
            queued(AlertSource::Calendar, "cal-1"),
            queued(AlertSource::Email, "mail-2"),
        ];
        let digest = format_digest(&items, 5);
        assert!(digest.contains("3 items"));
        assert!(digest.contains("email (2):"));
        assert!(digest.contains("calendar (1):"));
        assert!(digest.contains("mail-1"));
        assert!(digest.contains("cal-1"));
    }

    #[test]
    fn digest_caps_each_group_with_more_suffix() {
        let items: Vec<QueuedNotification> = (0..8)
            .map(|i| queued(AlertSource::Email, &format!("mail-{i}")))
            .collect();
        let digest = format_digest(&items, 5);
        assert!(digest.contains("mail-4"));
        assert!(!digest.contains("mail-5"));
        assert!(digest.contains("...and 3 more"));
    }
}
