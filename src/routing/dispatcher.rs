//! Dispatcher — resolves a handler for a classified event and invokes it.
//!
//! `get_route` is a pure resolution step, usable for dry runs. `dispatch`
//! runs the resolved handler and never propagates handler failures: every
//! outcome, success or error, becomes a `DispatchResult`.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{error, info, warn};

use crate::event::ClassifiedEvent;
use crate::metrics::{MetricKind, MetricRecord, MetricsSink};
use crate::routing::registry::{HandlerName, HandlerRegistry};
use crate::routing::rules::{RouteConfig, RoutingRules};

/// How an event was routed.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub handler: HandlerName,
    pub matched_rule: Option<RouteConfig>,
    pub reasoning: String,
    pub metadata: serde_json::Value,
}

/// Outcome of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub decision: RoutingDecision,
}

/// Routes classified events to registered handlers.
pub struct Dispatcher {
    rules: RoutingRules,
    registry: Arc<HandlerRegistry>,
    metrics: Arc<dyn MetricsSink>,
}

impl Dispatcher {
    pub fn new(
        rules: RoutingRules,
        registry: Arc<HandlerRegistry>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            rules,
            registry,
            metrics,
        }
    }

    pub fn rules_mut(&mut self) -> &mut RoutingRules {
        &mut self.rules
    }

    /// Resolve the handler for an event without invoking it.
    ///
    /// An unregistered handler name is silently substituted with the
    /// generalist orchestrator; the substitution is recorded in
    /// `reasoning`, never surfaced as an error.
    pub async fn get_route(&self, event: &ClassifiedEvent) -> RoutingDecision {
        let category = event.classification.category;

        let (resolved, matched_rule, has_custom_rule, mut reasoning) =
            match self.rules.find_matching_rule(event) {
                Some((rule, is_custom)) => {
                    let kind = if is_custom { "custom" } else { "default" };
                    (
                        rule.handler.clone(),
                        Some(rule.clone()),
                        is_custom,
                        format!(
                            "{kind} rule (priority {}) for category '{category}' → '{}'",
                            rule.priority, rule.handler
                        ),
                    )
                }
                None => (
                    HandlerName::orchestrator(),
                    None,
                    false,
                    format!("no rule matched category '{category}', using orchestrator"),
                ),
            };

        let handler = if self.registry.has(&resolved).await {
            resolved
        } else {
            let fallback = HandlerName::orchestrator();
            warn!(
                webhook_id = %event.event.webhook_id,
                requested = %resolved,
                "Handler not registered, substituting orchestrator"
            );
            reasoning.push_str(&format!(
                "; handler '{resolved}' not registered, substituted '{fallback}'"
            ));
            fallback
        };

        RoutingDecision {
            handler,
            matched_rule,
            reasoning,
            metadata: json!({
                "has_custom_rule": has_custom_rule,
                "category": category.as_str(),
                "webhook_id": event.event.webhook_id,
            }),
        }
    }

    /// Resolve and invoke the handler. Handler failures are caught and
    /// converted into a failed `DispatchResult` — they never propagate.
    pub async fn dispatch(&self, event: &ClassifiedEvent) -> DispatchResult {
        let decision = self.get_route(event).await;
        let started = Instant::now();

        let result = match self.registry.get(&decision.handler).await {
            Some(handler) => match handler.handle(event).await {
                Ok(outcome) => DispatchResult {
                    success: outcome.success,
                    message: outcome.message,
                    error: None,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    decision,
                },
                Err(e) => {
                    error!(
                        webhook_id = %event.event.webhook_id,
                        source = %event.event.source,
                        category = %event.classification.category,
                        error = %e,
                        "Handler execution failed"
                    );
                    DispatchResult {
                        success: false,
                        message: None,
                        error: Some(e.to_string()),
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        decision,
                    }
                }
            },
            None => {
                // Even the orchestrator fallback is missing.
                error!(
                    webhook_id = %event.event.webhook_id,
                    handler = %decision.handler,
                    "No handler available for dispatch"
                );
                DispatchResult {
                    success: false,
                    message: None,
                    error: Some(format!("handler '{}' not registered", decision.handler)),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    decision,
                }
            }
        };

        self.metrics.record(MetricRecord::new(
            MetricKind::Dispatch,
            result.elapsed_ms,
            result.success,
            json!({
                "webhook_id": event.event.webhook_id,
                "handler": result.decision.handler.as_str(),
                "has_custom_rule": result.decision.metadata["has_custom_rule"],
            }),
        ));

        info!(
            webhook_id = %event.event.webhook_id,
            handler = %result.decision.handler,
            success = result.success,
            elapsed_ms = result.elapsed_ms,
            "Dispatch complete"
        );

        result
    }
}
