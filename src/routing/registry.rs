//! Handler registry — name → handler lookup table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RoutingError;
use crate::event::ClassifiedEvent;

// ── Handler name ────────────────────────────────────────────────────

/// Typed handler identifier. The three built-in handlers have named
/// constructors; custom rules may target any registered name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerName(String);

impl HandlerName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Calendar-category handler.
    pub fn scheduler() -> Self {
        Self("scheduler".into())
    }

    /// Communication/notification-category handler.
    pub fn notifier() -> Self {
        Self("notifier".into())
    }

    /// Generalist handler — also the fallback for unregistered names.
    pub fn orchestrator() -> Self {
        Self("orchestrator".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandlerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Handler trait ───────────────────────────────────────────────────

/// Outcome reported by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl HandlerOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Downstream event handler. The core treats handlers as opaque named
/// callables; their side effects live outside this crate.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: &ClassifiedEvent) -> Result<HandlerOutcome, RoutingError>;
}

// ── Registry ────────────────────────────────────────────────────────

/// Registry of available handlers.
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<HandlerName, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, name: HandlerName, handler: Arc<dyn Handler>) {
        debug!(handler = %name, "Registered handler");
        self.handlers.write().await.insert(name, handler);
    }

    pub async fn get(&self, name: &HandlerName) -> Option<Arc<dyn Handler>> {
        self.handlers.read().await.get(name).cloned()
    }

    pub async fn has(&self, name: &HandlerName) -> bool {
        self.handlers.read().await.contains_key(name)
    }

    pub async fn list(&self) -> Vec<HandlerName> {
        self.handlers.read().await.keys().cloned().collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
