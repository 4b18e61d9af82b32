//! Tiered classifier — confidence-gated escalation across cost tiers.

use std::sync::Arc;
use std::time::Instant;

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::classifier::cache::ClassificationCache;
use crate::classifier::prompts::{PriorAttempt, build_messages};
use crate::classifier::types::{ClassificationResult, Tier};
use crate::config::{ClassifierConfig, TierConfig};
use crate::error::ClassifierError;
use crate::event::{EventAction, EventCategory, WebhookEvent};
use crate::llm::{CompletionRequest, LlmProvider, TokenUsage};
use crate::metrics::{MetricKind, MetricRecord, MetricsSink};

/// Classifies events by escalating through cheap → standard → premium
/// tiers until a tier's confidence clears its acceptance threshold.
pub struct TieredClassifier {
    provider: Arc<dyn LlmProvider>,
    cache: Arc<ClassificationCache>,
    config: ClassifierConfig,
    metrics: Arc<dyn MetricsSink>,
}

/// One tier's parsed, validated outcome.
#[derive(Debug, Clone)]
struct TierOutcome {
    tier: Tier,
    model: String,
    category: EventCategory,
    confidence: f64,
    actions: Vec<EventAction>,
    reasoning: String,
    cost: Decimal,
}

impl TieredClassifier {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        cache: Arc<ClassificationCache>,
        config: ClassifierConfig,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            provider,
            cache,
            config,
            metrics,
        }
    }

    pub fn cache(&self) -> &Arc<ClassificationCache> {
        &self.cache
    }

    fn tier_config(&self, tier: Tier) -> &TierConfig {
        match tier {
            Tier::Cheap => &self.config.cheap,
            Tier::Standard => &self.config.standard,
            Tier::Premium => &self.config.premium,
        }
    }

    /// Does this tier's confidence stop the escalation?
    ///
    /// The standard tier stops against the premium threshold — a lower bar
    /// than the cheap tier's, reserving premium calls for genuinely
    /// low-confidence events.
    fn accepts(&self, tier: Tier, confidence: f64) -> bool {
        match tier {
            Tier::Cheap => confidence >= self.config.thresholds.standard,
            Tier::Standard => confidence >= self.config.thresholds.premium,
            Tier::Premium => true,
        }
    }

    /// Classify an event, consulting the cache first.
    pub async fn classify(
        &self,
        event: &WebhookEvent,
    ) -> Result<ClassificationResult, ClassifierError> {
        if let Some(cached) = self.cache.get(event).await {
            self.metrics.record(MetricRecord::new(
                MetricKind::CacheHit,
                0,
                true,
                json!({
                    "webhook_id": event.webhook_id,
                    "source": event.source.as_str(),
                    "category": cached.category.as_str(),
                }),
            ));
            return Ok(cached);
        }

        let mut successes: Vec<TierOutcome> = Vec::new();
        let mut last_error = String::new();

        for tier in [Tier::Cheap, Tier::Standard, Tier::Premium] {
            match self.attempt_tier(tier, event, &successes).await {
                Ok(outcome) => {
                    let accepted = self.accepts(tier, outcome.confidence);
                    debug!(
                        webhook_id = %event.webhook_id,
                        tier = %tier,
                        confidence = outcome.confidence,
                        accepted,
                        "Tier attempt succeeded"
                    );
                    successes.push(outcome);
                    if accepted {
                        break;
                    }
                }
                Err(reason) => {
                    if tier == Tier::Premium {
                        // Terminal tier — nothing left to escalate to.
                        return Err(ClassifierError::AllTiersFailed {
                            webhook_id: event.webhook_id.clone(),
                            reason,
                        });
                    }
                    warn!(
                        webhook_id = %event.webhook_id,
                        source = %event.source,
                        tier = %tier,
                        error = %reason,
                        "Tier failed, escalating"
                    );
                    last_error = reason;
                }
            }
        }

        let Some(last) = successes.last() else {
            return Err(ClassifierError::AllTiersFailed {
                webhook_id: event.webhook_id.clone(),
                reason: last_error,
            });
        };

        let escalation_path: Vec<String> = successes.iter().map(|o| o.model.clone()).collect();
        let escalated = last.tier != Tier::Cheap;
        let result = ClassificationResult {
            category: last.category,
            confidence: last.confidence,
            actions: last.actions.clone(),
            tier: last.tier,
            model: last.model.clone(),
            cost: last.cost,
            reasoning: last.reasoning.clone(),
            escalated,
            escalation_path,
        };

        if escalated {
            let cumulative: Decimal = successes.iter().map(|o| o.cost).sum();
            self.metrics.record(MetricRecord::new(
                MetricKind::Escalation,
                0,
                true,
                json!({
                    "webhook_id": event.webhook_id,
                    "final_tier": result.tier.as_str(),
                    "path": result.escalation_path,
                    "cumulative_cost": cumulative.to_string(),
                }),
            ));
        }

        info!(
            webhook_id = %event.webhook_id,
            category = %result.category,
            confidence = result.confidence,
            tier = %result.tier,
            escalated = result.escalated,
            "Event classified"
        );

        self.cache.set(event, result.clone()).await;
        Ok(result)
    }

    /// Run one tier: prompt, call, parse, validate. Any transport, timeout,
    /// or parse failure comes back as a plain reason string — the caller
    /// decides whether it escalates or propagates.
    async fn attempt_tier(
        &self,
        tier: Tier,
        event: &WebhookEvent,
        prior: &[TierOutcome],
    ) -> Result<TierOutcome, String> {
        let tier_cfg = self.tier_config(tier);
        let prior_attempts: Vec<PriorAttempt> = prior
            .iter()
            .map(|o| PriorAttempt {
                model: o.model.clone(),
                category: o.category.as_str().to_string(),
                confidence: o.confidence,
                reasoning: o.reasoning.clone(),
            })
            .collect();

        let request = CompletionRequest::new(&tier_cfg.model, build_messages(tier, event, &prior_attempts))
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.config.tier_timeout, self.provider.complete(request))
            .await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.emit_attempt_metric(tier, &tier_cfg.model, latency_ms, false, event);
                return Err(format!("provider error: {e}"));
            }
            Err(_) => {
                self.emit_attempt_metric(tier, &tier_cfg.model, latency_ms, false, event);
                return Err(format!(
                    "tier call timed out after {:?}",
                    self.config.tier_timeout
                ));
            }
        };

        let parsed = parse_tier_response(&response.content).map_err(|e| {
            self.emit_attempt_metric(tier, &tier_cfg.model, latency_ms, false, event);
            format!("malformed model output: {e}")
        })?;

        self.emit_attempt_metric(tier, &tier_cfg.model, latency_ms, true, event);

        Ok(TierOutcome {
            tier,
            model: tier_cfg.model.clone(),
            category: parsed.category,
            confidence: parsed.confidence,
            actions: parsed.actions,
            reasoning: parsed.reasoning,
            cost: response_cost(tier_cfg, &response.usage),
        })
    }

    fn emit_attempt_metric(
        &self,
        tier: Tier,
        model: &str,
        latency_ms: u64,
        success: bool,
        event: &WebhookEvent,
    ) {
        self.metrics.record(MetricRecord::new(
            MetricKind::Classification,
            latency_ms,
            success,
            json!({
                "webhook_id": event.webhook_id,
                "source": event.source.as_str(),
                "tier": tier.as_str(),
                "model": model,
            }),
        ));
    }
}

/// Cost of one response: the provider's own figure when it has a pricing
/// table, otherwise recomputed from the tier's configured rates.
fn response_cost(tier_cfg: &TierConfig, usage: &TokenUsage) -> Decimal {
    if usage.cost > Decimal::ZERO {
        return usage.cost;
    }
    let per_k = Decimal::from(1000u32);
    Decimal::from(usage.prompt_tokens) * tier_cfg.prompt_cost_per_1k / per_k
        + Decimal::from(usage.completion_tokens) * tier_cfg.completion_cost_per_1k / per_k
}

// ── Response parsing ────────────────────────────────────────────────

/// Validated shape of a tier's JSON response.
#[derive(Debug)]
struct ParsedResponse {
    category: EventCategory,
    confidence: f64,
    actions: Vec<EventAction>,
    reasoning: String,
}

/// Raw model output before validation.
#[derive(Debug, serde::Deserialize)]
struct RawTierResponse {
    category: String,
    confidence: f64,
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

/// Parse and validate a tier's response: strict JSON (code fences
/// stripped), unknown categories map to `Unknown`, unknown actions are
/// filtered (empty set defaults to `[Review]`), confidence clamped.
fn parse_tier_response(raw: &str) -> Result<ParsedResponse, String> {
    let json_str = extract_json_object(raw);
    let raw: RawTierResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let mut actions: Vec<EventAction> = raw
        .actions
        .iter()
        .filter_map(|a| EventAction::parse(a))
        .collect();
    actions.dedup();
    if actions.is_empty() {
        actions.push(EventAction::Review);
    }

    Ok(ParsedResponse {
        category: EventCategory::parse(&raw.category),
        confidence: raw.confidence.clamp(0.0, 1.0),
        actions,
        reasoning: raw.reasoning,
    })
}

/// Extract a JSON object from model output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
