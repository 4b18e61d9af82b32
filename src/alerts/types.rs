//! Alert types and the priority ladder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert priority, P0 (urgent, bypasses everything) to P3 (log only).
///
/// Level transitions only ever increase urgency: boosting saturates at P0
/// and flooring never lowers an already-higher level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    P0,
    P1,
    P2,
    P3,
}

impl AlertLevel {
    /// One level more urgent; P0 stays P0.
    pub fn boost(self) -> Self {
        match self {
            Self::P0 | Self::P1 => Self::P0,
            Self::P2 => Self::P1,
            Self::P3 => Self::P2,
        }
    }

    /// Raise to at least `floor`; never lowers.
    pub fn at_least(self, floor: Self) -> Self {
        if floor.is_more_urgent_than(self) {
            floor
        } else {
            self
        }
    }

    pub fn is_more_urgent_than(self, other: Self) -> bool {
        self.rank() < other.rank()
    }

    fn rank(self) -> u8 {
        match self {
            Self::P0 => 0,
            Self::P1 => 1,
            Self::P2 => 2,
            Self::P3 => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of source item produced the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    Email,
    Calendar,
}

impl AlertSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Calendar => "calendar",
        }
    }
}

impl std::fmt::Display for AlertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prioritized notification candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedAlert {
    pub level: AlertLevel,
    pub title: String,
    pub body: String,
    pub source: AlertSource,
    pub source_id: String,
    /// Human-readable list of every rule that fired.
    pub signals: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// An email as seen by the alert classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailItem {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    /// All recipient addresses.
    pub to: Vec<String>,
    pub received_at: DateTime<Utc>,
}

/// A calendar event as seen by the alert classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarItem {
    pub id: String,
    pub summary: String,
    pub organizer: String,
    pub start: DateTime<Utc>,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_saturates_at_p0() {
        assert_eq!(AlertLevel::P3.boost(), AlertLevel::P2);
        assert_eq!(AlertLevel::P2.boost(), AlertLevel::P1);
        assert_eq!(AlertLevel::P1.boost(), AlertLevel::P0);
        assert_eq!(AlertLevel::P0.boost(), AlertLevel::P0);
        assert_eq!(AlertLevel::P0.boost().boost().boost(), AlertLevel::P0);
    }

    #[test]
    fn at_least_never_lowers() {
        assert_eq!(AlertLevel::P2.at_least(AlertLevel::P1), AlertLevel::P1);
        assert_eq!(AlertLevel::P0.at_least(AlertLevel::P1), AlertLevel::P0);
        assert_eq!(AlertLevel::P3.at_least(AlertLevel::P3), AlertLevel::P3);
    }

    #[test]
    fn urgency_ordering() {
        assert!(AlertLevel::P0.is_more_urgent_than(AlertLevel::P1));
        assert!(!AlertLevel::P2.is_more_urgent_than(AlertLevel::P1));
        assert!(!AlertLevel::P1.is_more_urgent_than(AlertLevel::P1));
    }
}
