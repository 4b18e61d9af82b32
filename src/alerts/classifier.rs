//! Email and calendar alert classification rules.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use tracing::debug;

use crate::alerts::types::{AlertLevel, AlertSource, CalendarItem, ClassifiedAlert, EmailItem};
use crate::config::AlertConfig;

/// Classifies source items into prioritized alerts. Patterns are compiled
/// once at construction; classification itself is a pure function of the
/// item (plus `now` for calendar items).
pub struct AlertClassifier {
    config: AlertConfig,
    automated_senders: Vec<Regex>,
    bulk_content: Vec<Regex>,
}

impl AlertClassifier {
    pub fn new(config: AlertConfig) -> Self {
        // Pattern set follows the usual automated-mail shapes: noreply
        // senders, mail system daemons, marketing domains, unsubscribe
        // footers, receipts and shipping notices.
        let automated_senders = vec![
            Regex::new(r"(?i)^no[\-_.]?reply@").unwrap(),
            Regex::new(r"(?i)^(mailer[\-_]?daemon|postmaster)@").unwrap(),
            Regex::new(r"(?i)@(marketing|newsletter|promo|campaign)\b").unwrap(),
            Regex::new(r"(?i)^notifications@").unwrap(),
        ];
        let bulk_content = vec![
            Regex::new(r"(?i)\bunsubscribe\b").unwrap(),
            Regex::new(r"(?i)(manage your subscription|email preferences|opt[- ]?out)").unwrap(),
            Regex::new(r"(?i)(receipt for|invoice #|your (receipt|transaction|order))").unwrap(),
            Regex::new(r"(?i)(has (shipped|been delivered)|out for delivery)").unwrap(),
        ];
        Self {
            config,
            automated_senders,
            bulk_content,
        }
    }

    fn is_vip(&self, address: &str) -> bool {
        let lower = address.to_lowercase();
        self.config
            .vip_senders
            .iter()
            .any(|vip| lower.contains(&vip.to_lowercase()))
    }

    // ── Email ───────────────────────────────────────────────────────

    /// Classify an email. Baseline P2; automated/bulk mail is forced to
    /// P3 with no further boosting; otherwise VIP floors at P1, urgent
    /// keywords and replies to the user each boost one level.
    pub fn classify_email(&self, email: &EmailItem) -> ClassifiedAlert {
        let mut level = AlertLevel::P2;
        let mut signals = Vec::new();

        let automated = self
            .automated_senders
            .iter()
            .any(|re| re.is_match(&email.from));
        let bulk = self
            .bulk_content
            .iter()
            .any(|re| re.is_match(&email.subject) || re.is_match(&email.snippet));

        if automated || bulk {
            let reason = if automated {
                format!("automated sender ({})", email.from)
            } else {
                "newsletter/receipt content".to_string()
            };
            signals.push(reason);
            return self.finish_email(email, AlertLevel::P3, signals);
        }

        if self.is_vip(&email.from) {
            level = level.at_least(AlertLevel::P1);
            signals.push(format!("VIP sender ({})", email.from));
        }

        let haystack = format!(
            "{} {}",
            email.subject.to_lowercase(),
            email.snippet.to_lowercase()
        );
        if let Some(keyword) = self
            .config
            .urgent_keywords
            .iter()
            .find(|k| haystack.contains(&k.to_lowercase()))
        {
            level = level.boost();
            signals.push(format!("urgent keyword '{keyword}'"));
        }

        if is_reply_to_user(email, &self.config.user_addresses) {
            level = level.boost();
            signals.push("reply to you".to_string());
        }

        self.finish_email(email, level, signals)
    }

    fn finish_email(
        &self,
        email: &EmailItem,
        level: AlertLevel,
        signals: Vec<String>,
    ) -> ClassifiedAlert {
        debug!(
            id = %email.id,
            from = %email.from,
            level = %level,
            signals = signals.len(),
            "Classified email alert"
        );
        ClassifiedAlert {
            level,
            title: email.subject.clone(),
            body: email.snippet.clone(),
            source: AlertSource::Email,
            source_id: email.id.clone(),
            signals,
            timestamp: Utc::now(),
            metadata: serde_json::json!({"from": email.from}),
        }
    }

    // ── Calendar ────────────────────────────────────────────────────

    /// Classify a calendar event at a given instant. Baseline P2; the
    /// start time sets P0 (within 1h) or P1 (within 24h), but an event
    /// that has already started gets no time-based urgency; cancellation
    /// floors at P1; a VIP organizer boosts one level after the
    /// time-based level is set.
    pub fn classify_calendar(&self, item: &CalendarItem, now: DateTime<Utc>) -> ClassifiedAlert {
        let mut level = AlertLevel::P2;
        let mut signals = Vec::new();

        let until_start = item.start.signed_duration_since(now);
        if until_start < Duration::zero() {
            // Already started — urgency windows no longer apply.
            signals.push("already started".to_string());
        } else if until_start <= Duration::hours(1) {
            level = AlertLevel::P0;
            signals.push("starts within 1 hour".to_string());
        } else if until_start <= Duration::hours(24) {
            level = AlertLevel::P1;
            signals.push("starts within 24 hours".to_string());
        }

        if item.cancelled {
            level = level.at_least(AlertLevel::P1);
            signals.push("event cancelled".to_string());
        }

        if self.is_vip(&item.organizer) {
            level = level.boost();
            signals.push(format!("VIP organizer ({})", item.organizer));
        }

        if signals.is_empty() {
            signals.push("calendar event".to_string());
        }

        debug!(
            id = %item.id,
            level = %level,
            signals = signals.len(),
            "Classified calendar alert"
        );
        ClassifiedAlert {
            level,
            title: item.summary.clone(),
            body: format!("Starts {}", item.start.to_rfc3339()),
            source: AlertSource::Calendar,
            source_id: item.id.clone(),
            signals,
            timestamp: now,
            metadata: serde_json::json!({"organizer": item.organizer}),
        }
    }
}

/// A reply addressed to the user: "Re:" subject and a user address among
/// the recipients.
fn is_reply_to_user(email: &EmailItem, user_addresses: &[String]) -> bool {
    if !email.subject.to_lowercase().starts_with("re:") {
        return false;
    }
    email.to.iter().any(|addr| {
        let lower = addr.to_lowercase();
        user_addresses.iter().any(|u| lower == u.to_lowercase())
    })
}
