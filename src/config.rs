//! Configuration types.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Per-tier model binding and token pricing.
#[derive(Debug, Clone)]
pub struct TierConfig {
    /// Model identifier passed to the LLM provider.
    pub model: String,
    /// Cost per 1k prompt tokens.
    pub prompt_cost_per_1k: Decimal,
    /// Cost per 1k completion tokens.
    pub completion_cost_per_1k: Decimal,
}

/// Confidence thresholds that gate tier escalation.
///
/// A cheap-tier result is accepted at `standard` and above; a standard-tier
/// result is accepted at `premium` and above. The premium tier is terminal
/// and accepts any confidence. The lower standard-tier bar reserves premium
/// calls for genuinely low-confidence events.
#[derive(Debug, Clone, Copy)]
pub struct EscalationThresholds {
    pub standard: f64,
    pub premium: f64,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            standard: 0.8,
            premium: 0.5,
        }
    }
}

/// Tiered classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub cheap: TierConfig,
    pub standard: TierConfig,
    pub premium: TierConfig,
    pub thresholds: EscalationThresholds,
    /// Cache TTL for classification results.
    pub cache_ttl: Duration,
    /// Caller-supplied timeout wrapped around each provider call.
    /// A timed-out tier is treated as a tier failure.
    pub tier_timeout: Duration,
    /// Max completion tokens per tier call.
    pub max_tokens: u32,
    /// Sampling temperature (kept near-deterministic for triage).
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cheap: TierConfig {
                model: "gpt-4o-mini".into(),
                prompt_cost_per_1k: dec!(0.00015),
                completion_cost_per_1k: dec!(0.0006),
            },
            standard: TierConfig {
                model: "gpt-4o".into(),
                prompt_cost_per_1k: dec!(0.0025),
                completion_cost_per_1k: dec!(0.01),
            },
            premium: TierConfig {
                model: "o1".into(),
                prompt_cost_per_1k: dec!(0.015),
                completion_cost_per_1k: dec!(0.06),
            },
            thresholds: EscalationThresholds::default(),
            cache_ttl: Duration::from_secs(300),
            tier_timeout: Duration::from_secs(30),
            max_tokens: 512,
            temperature: 0.1,
        }
    }
}

/// Heuristic alert classification configuration.
#[derive(Debug, Clone, Default)]
pub struct AlertConfig {
    /// Senders/organizers whose mail floors at P1 (email) or boosts
    /// the calendar level by one.
    pub vip_senders: Vec<String>,
    /// Keywords that boost an email one level when present in the
    /// subject or body.
    pub urgent_keywords: Vec<String>,
    /// The user's own addresses — a "Re:" addressed to one of these
    /// boosts one level.
    pub user_addresses: Vec<String>,
}

/// Daily quiet-hours window during which non-urgent notifications defer.
#[derive(Debug, Clone)]
pub struct QuietHoursConfig {
    /// Window start, "HH:MM".
    pub start: String,
    /// Window end, "HH:MM". If start > end the window wraps past midnight.
    pub end: String,
    /// Local timezone as a UTC offset in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            start: "22:00".into(),
            end: "07:00".into(),
            utc_offset_minutes: 0,
        }
    }
}

/// Notification router configuration.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub quiet_hours: QuietHoursConfig,
    /// Delay between individual sends when draining the quiet-hours
    /// queue, to respect downstream rate limits.
    pub inter_message_delay: Duration,
    /// Max alerts shown per source group in a batch digest.
    pub digest_group_cap: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            quiet_hours: QuietHoursConfig::default(),
            inter_message_delay: Duration::from_millis(250),
            digest_group_cap: 5,
        }
    }
}
