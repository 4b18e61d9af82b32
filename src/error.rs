//! Error types for the event triage core.

use std::time::Duration;

/// Top-level error type.
///
/// Only failures that actually propagate out of the crate's entry points
/// appear here. Routing and notification errors are absorbed at their
/// seams: the dispatcher folds `RoutingError` into failed dispatch
/// results, and the notification router reports `NotifyError` inside
/// delivery results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Request to {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },
}

/// Classification errors.
///
/// Per-tier failures are recovered internally by escalating to the next
/// tier; only a terminal-tier failure surfaces through this type.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("All classification tiers failed for event {webhook_id}: {reason}")]
    AllTiersFailed { webhook_id: String, reason: String },
}

/// Routing/dispatch errors. Returned by `Handler` implementations; the
/// dispatcher converts them into failed results rather than propagating.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("Handler {name} failed: {reason}")]
    HandlerFailed { name: String, reason: String },
}

/// Notification delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Invalid quiet hours window {start}..{end}: {reason}")]
    InvalidWindow {
        start: String,
        end: String,
        reason: String,
    },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
