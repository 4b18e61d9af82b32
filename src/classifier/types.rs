//! Classification result types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::event::{EventAction, EventCategory};

/// Cost tier. Escalation only ever moves cheap → standard → premium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Cheap,
    Standard,
    Premium,
}

impl Tier {
    /// The next, more expensive tier. `None` at the terminal tier.
    pub fn next(self) -> Option<Tier> {
        match self {
            Self::Cheap => Some(Self::Standard),
            Self::Standard => Some(Self::Premium),
            Self::Premium => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cheap => "cheap",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one event. Immutable once returned; cached
/// verbatim and returned unchanged on cache hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: EventCategory,
    /// Always clamped to [0, 1].
    pub confidence: f64,
    /// Non-empty; unknown model actions are filtered, empty defaults
    /// to `[Review]`.
    pub actions: Vec<EventAction>,
    /// Tier that produced the returned result.
    pub tier: Tier,
    /// Model bound to that tier.
    pub model: String,
    /// Cost of the returned tier's own response. Cumulative escalation
    /// cost is reported via escalation metrics, not embedded here.
    pub cost: Decimal,
    /// Model-supplied rationale, kept for operator triage.
    pub reasoning: String,
    pub escalated: bool,
    /// Models that were invoked and returned a result, in order.
    pub escalation_path: Vec<String>,
}
