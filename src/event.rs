//! Normalized inbound events.
//!
//! Ingestion (HTTP endpoints, pollers) lives outside this crate. Adapters
//! convert their native webhook format into a `WebhookEvent`; everything in
//! the core treats the payload as read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassificationResult;

// ── Event source ────────────────────────────────────────────────────

/// Where an event came from. Drives cache key-field extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    GitHub,
    Calendar,
    Email,
    /// Unrecognized source — fingerprinting falls back to the whole payload.
    Other(String),
}

impl EventSource {
    /// Stable string form used in fingerprints, metrics, and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Self::GitHub => "github",
            Self::Calendar => "calendar",
            Self::Email => "email",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Webhook event ───────────────────────────────────────────────────

/// Normalized inbound event from any source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Originating source.
    pub source: EventSource,
    /// Source-native webhook/delivery id.
    pub webhook_id: String,
    /// When the event was received.
    pub timestamp: DateTime<Utc>,
    /// Opaque source payload.
    pub payload: serde_json::Value,
}

// ── Category ────────────────────────────────────────────────────────

/// Classified event category — a closed set, never free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Calendar,
    Communication,
    Task,
    Notification,
    Unknown,
}

impl EventCategory {
    /// Parse a model-supplied category string. Unrecognized values map to
    /// `Unknown` rather than failing the classification.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "calendar" => Self::Calendar,
            "communication" => Self::Communication,
            "task" => Self::Task,
            "notification" => Self::Notification,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Communication => "communication",
            Self::Task => "task",
            Self::Notification => "notification",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Actions ─────────────────────────────────────────────────────────

/// Suggested follow-up action for a classified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Schedule,
    Reply,
    Notify,
    CreateTask,
    Review,
    Archive,
}

impl EventAction {
    /// Parse a model-supplied action string. Unknown actions are dropped by
    /// the caller (`None` here), and an empty set defaults to `[Review]`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "schedule" => Some(Self::Schedule),
            "reply" => Some(Self::Reply),
            "notify" => Some(Self::Notify),
            "create_task" => Some(Self::CreateTask),
            "review" => Some(Self::Review),
            "archive" => Some(Self::Archive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Reply => "reply",
            Self::Notify => "notify",
            Self::CreateTask => "create_task",
            Self::Review => "review",
            Self::Archive => "archive",
        }
    }
}

// ── Classified event ────────────────────────────────────────────────

/// An event paired with its classification — the dispatcher's input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedEvent {
    pub event: WebhookEvent,
    pub classification: ClassificationResult,
}

impl ClassifiedEvent {
    /// JSON view used for dotted-path condition lookup in routing rules
    /// (e.g. `classification.confidence`, `event.payload.action`).
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
