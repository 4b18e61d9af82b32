//! Routing rules — condition-based, priority-ordered rule matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::event::{ClassifiedEvent, EventCategory};
use crate::routing::registry::HandlerName;

// ── Conditions ──────────────────────────────────────────────────────

/// Condition operator applied to a dotted-path field of the classified
/// event's JSON view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Equals,
    /// Substring for strings, membership for arrays.
    Contains,
    /// Regex match against a string field.
    Matches,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// A single rule condition, e.g. `classification.confidence gte 0.7`.
///
/// A condition on a missing or type-mismatched field evaluates false —
/// it never errors and never matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteCondition {
    /// Dotted path into the classified event, e.g.
    /// `event.payload.action` or `classification.confidence`.
    pub field: String,
    pub op: ConditionOp,
    pub value: Value,
}

impl RouteCondition {
    pub fn new(field: impl Into<String>, op: ConditionOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Evaluate against the event's JSON view.
    pub fn evaluate(&self, root: &Value) -> bool {
        let Some(actual) = lookup_path(root, &self.field) else {
            return false;
        };

        match self.op {
            ConditionOp::Equals => values_equal(actual, &self.value),
            ConditionOp::Contains => match actual {
                Value::String(s) => self
                    .value
                    .as_str()
                    .map(|needle| s.contains(needle))
                    .unwrap_or(false),
                Value::Array(items) => items.iter().any(|item| values_equal(item, &self.value)),
                _ => false,
            },
            ConditionOp::Matches => match (actual.as_str(), self.value.as_str()) {
                (Some(s), Some(pattern)) => Regex::new(pattern)
                    .map(|re| re.is_match(s))
                    .unwrap_or(false),
                _ => false,
            },
            ConditionOp::Gt | ConditionOp::Lt | ConditionOp::Gte | ConditionOp::Lte => {
                let (Some(a), Some(b)) = (actual.as_f64(), self.value.as_f64()) else {
                    return false;
                };
                match self.op {
                    ConditionOp::Gt => a > b,
                    ConditionOp::Lt => a < b,
                    ConditionOp::Gte => a >= b,
                    ConditionOp::Lte => a <= b,
                    _ => unreachable!(),
                }
            }
        }
    }
}

/// Walk a dotted path through nested objects (and array indices).
fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Equality tolerant of integer/float representation differences.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

// ── Rules ───────────────────────────────────────────────────────────

/// A routing rule. Higher priority wins; a rule with no conditions
/// matches on category alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub category: EventCategory,
    pub handler: HandlerName,
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<RouteCondition>,
}

impl RouteConfig {
    pub fn new(category: EventCategory, handler: HandlerName, priority: i32) -> Self {
        Self {
            category,
            handler,
            priority,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: RouteCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn matches(&self, event: &ClassifiedEvent, view: &Value) -> bool {
        self.category == event.classification.category
            && self.conditions.iter().all(|c| c.evaluate(view))
    }
}

/// Ordered rule set: custom rules (descending priority) consulted before
/// the default per-category rules.
#[derive(Debug, Clone)]
pub struct RoutingRules {
    custom: Vec<RouteConfig>,
    defaults: Vec<RouteConfig>,
}

impl RoutingRules {
    /// Rules with the standard category defaults: calendar events to the
    /// scheduler, communication/notification to the notifier, task and
    /// unknown to the generalist orchestrator.
    pub fn with_defaults() -> Self {
        let defaults = vec![
            RouteConfig::new(EventCategory::Calendar, HandlerName::scheduler(), 0),
            RouteConfig::new(EventCategory::Communication, HandlerName::notifier(), 0),
            RouteConfig::new(EventCategory::Notification, HandlerName::notifier(), 0),
            RouteConfig::new(EventCategory::Task, HandlerName::orchestrator(), 0),
            RouteConfig::new(EventCategory::Unknown, HandlerName::orchestrator(), 0),
        ];
        Self {
            custom: Vec::new(),
            defaults,
        }
    }

    /// An empty rule set (for testing).
    pub fn empty() -> Self {
        Self {
            custom: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Add a custom rule. The custom list stays sorted by descending
    /// priority; insertion order breaks ties.
    pub fn add_rule(&mut self, rule: RouteConfig) {
        debug!(
            category = %rule.category,
            handler = %rule.handler,
            priority = rule.priority,
            "Adding routing rule"
        );
        self.custom.push(rule);
        self.custom.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// First rule whose category matches and whose conditions all hold.
    /// Returns whether the match came from the custom set.
    pub fn find_matching_rule(&self, event: &ClassifiedEvent) -> Option<(&RouteConfig, bool)> {
        let view = event.as_json();
        if let Some(rule) = self.custom.iter().find(|r| r.matches(event, &view)) {
            return Some((rule, true));
        }
        self.defaults
            .iter()
            .find(|r| r.matches(event, &view))
            .map(|r| (r, false))
    }

    pub fn custom_rule_count(&self) -> usize {
        self.custom.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationResult, Tier};
    use crate::event::{EventAction, EventSource, WebhookEvent};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn make_event(category: EventCategory, confidence: f64, payload: Value) -> ClassifiedEvent {
        ClassifiedEvent {
            event: WebhookEvent {
                source: EventSource::GitHub,
                webhook_id: "wh-1".into(),
                timestamp: Utc::now(),
                payload,
            },
            classification: ClassificationResult {
                category,
                confidence,
                actions: vec![EventAction::Review],
                tier: Tier::Cheap,
                model: "gpt-4o-mini".into(),
                cost: Decimal::ZERO,
                reasoning: String::new(),
                escalated: false,
                escalation_path: vec!["gpt-4o-mini".into()],
            },
        }
    }

    #[test]
    fn default_rules_cover_every_category() {
        let rules = RoutingRules::with_defaults();
        for category in [
            EventCategory::Calendar,
            EventCategory::Communication,
            EventCategory::Task,
            EventCategory::Notification,
            EventCategory::Unknown,
        ] {
            let event = make_event(category, 0.9, json!({}));
            let (rule, is_custom) = rules.find_matching_rule(&event).expect("default rule");
            assert_eq!(rule.category, category);
            assert!(!is_custom);
        }
    }

    #[test]
    fn custom_rule_beats_default() {
        let mut rules = RoutingRules::with_defaults();
        rules.add_rule(RouteConfig::new(
            EventCategory::Calendar,
            HandlerName::new("vip-scheduler"),
            10,
        ));

        let event = make_event(EventCategory::Calendar, 0.9, json!({}));
        let (rule, is_custom) = rules.find_matching_rule(&event).unwrap();
        assert_eq!(rule.handler.as_str(), "vip-scheduler");
        assert!(is_custom);
    }

    #[test]
    fn higher_priority_rule_wins() {
        let mut rules = RoutingRules::empty();
        rules.add_rule(RouteConfig::new(
            EventCategory::Task,
            HandlerName::new("low"),
            1,
        ));
        rules.add_rule(RouteConfig::new(
            EventCategory::Task,
            HandlerName::new("high"),
            100,
        ));

        let event = make_event(EventCategory::Task, 0.9, json!({}));
        let (rule, _) = rules.find_matching_rule(&event).unwrap();
        assert_eq!(rule.handler.as_str(), "high");
    }

    #[test]
    fn conditions_must_all_hold() {
        let mut rules = RoutingRules::empty();
        rules.add_rule(
            RouteConfig::new(EventCategory::Task, HandlerName::new("gated"), 5)
                .with_condition(RouteCondition::new(
                    "classification.confidence",
                    ConditionOp::Gte,
                    json!(0.8),
                ))
                .with_condition(RouteCondition::new(
                    "event.payload.action",
                    ConditionOp::Equals,
                    json!("opened"),
                )),
        );

        let matching = make_event(EventCategory::Task, 0.9, json!({"action": "opened"}));
        assert!(rules.find_matching_rule(&matching).is_some());

        let low_confidence = make_event(EventCategory::Task, 0.5, json!({"action": "opened"}));
        assert!(rules.find_matching_rule(&low_confidence).is_none());

        let wrong_action = make_event(EventCategory::Task, 0.9, json!({"action": "closed"}));
        assert!(rules.find_matching_rule(&wrong_action).is_none());
    }

    #[test]
    fn category_mismatch_never_matches() {
        let mut rules = RoutingRules::empty();
        rules.add_rule(RouteConfig::new(
            EventCategory::Calendar,
            HandlerName::scheduler(),
            5,
        ));
        let event = make_event(EventCategory::Task, 0.9, json!({}));
        assert!(rules.find_matching_rule(&event).is_none());
    }

    #[test]
    fn condition_contains_string_and_array() {
        let view = json!({"s": "hello world", "arr": ["a", "b"]});
        assert!(RouteCondition::new("s", ConditionOp::Contains, json!("world")).evaluate(&view));
        assert!(!RouteCondition::new("s", ConditionOp::Contains, json!("mars")).evaluate(&view));
        assert!(RouteCondition::new("arr", ConditionOp::Contains, json!("b")).evaluate(&view));
        assert!(!RouteCondition::new("arr", ConditionOp::Contains, json!("c")).evaluate(&view));
    }

    #[test]
    fn condition_matches_regex() {
        let view = json!({"subject": "Re: deploy window"});
        assert!(
            RouteCondition::new("subject", ConditionOp::Matches, json!(r"(?i)^re:"))
                .evaluate(&view)
        );
        // Invalid regex evaluates false, never errors.
        assert!(
            !RouteCondition::new("subject", ConditionOp::Matches, json!("(unclosed"))
                .evaluate(&view)
        );
    }

    #[test]
    fn condition_numeric_comparisons() {
        let view = json!({"n": 5});
        assert!(RouteCondition::new("n", ConditionOp::Gt, json!(4)).evaluate(&view));
        assert!(RouteCondition::new("n", ConditionOp::Gte, json!(5)).evaluate(&view));
        assert!(RouteCondition::new("n", ConditionOp::Lt, json!(6)).evaluate(&view));
        assert!(RouteCondition::new("n", ConditionOp::Lte, json!(5)).evaluate(&view));
        assert!(!RouteCondition::new("n", ConditionOp::Gt, json!(5)).evaluate(&view));
    }

    #[test]
    fn condition_missing_or_mismatched_field_is_false() {
        let view = json!({"s": "text"});
        assert!(!RouteCondition::new("missing", ConditionOp::Equals, json!(1)).evaluate(&view));
        assert!(!RouteCondition::new("s", ConditionOp::Gt, json!(1)).evaluate(&view));
        assert!(!RouteCondition::new("s.deeper", ConditionOp::Equals, json!(1)).evaluate(&view));
    }

    #[test]
    fn lookup_traverses_arrays() {
        let view = json!({"items": [{"name": "first"}]});
        assert!(
            RouteCondition::new("items.0.name", ConditionOp::Equals, json!("first"))
                .evaluate(&view)
        );
    }

    #[test]
    fn equals_tolerates_numeric_representations() {
        let view = json!({"n": 1.0});
        assert!(RouteCondition::new("n", ConditionOp::Equals, json!(1)).evaluate(&view));
    }
}
