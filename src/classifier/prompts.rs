//! Prompt construction for the tiered classifier.
//!
//! Each tier gets a progressively more analytical system prompt; standard
//! and premium prompts also carry the prior attempt(s) so the model can see
//! what the cheaper tier concluded and why it was insufficient.

use crate::classifier::types::Tier;
use crate::event::WebhookEvent;
use crate::llm::ChatMessage;

/// Max payload characters included in the prompt.
const PAYLOAD_PREVIEW_CHARS: usize = 2000;

/// A prior tier's parsed outcome, used as context in escalated prompts.
#[derive(Debug, Clone)]
pub struct PriorAttempt {
    pub model: String,
    pub category: String,
    pub confidence: f64,
    pub reasoning: String,
}

const SHARED_SCHEMA: &str = "Respond with ONLY a JSON object:\n\
    {\"category\": \"...\", \"confidence\": 0.0, \"actions\": [\"...\"], \"reasoning\": \"...\"}\n\n\
    Categories: calendar, communication, task, notification, unknown.\n\
    Actions (one or more): schedule, reply, notify, create_task, review, archive.\n\
    Confidence is your certainty in the category, 0.0-1.0. Be honest — a low\n\
    confidence hands the event to a stronger model.";

/// Build the system prompt for a tier.
pub fn build_system_prompt(tier: Tier) -> String {
    let instruction = match tier {
        Tier::Cheap => {
            "You are a fast webhook triage engine. Classify the event's intent \
             from its source and payload. Prefer obvious surface signals \
             (event names, action fields, subjects) over deep analysis."
        }
        Tier::Standard => {
            "You are a webhook triage engine. A cheaper model was not confident \
             about this event. Read the payload carefully, weigh the prior \
             attempt's reasoning, and classify the event's intent."
        }
        Tier::Premium => {
            "You are the final arbiter for webhook triage. Cheaper models could \
             not classify this event confidently. Reason step by step about the \
             payload's structure, the sender's likely intent, and the prior \
             attempts before committing to a category."
        }
    };
    format!("{instruction}\n\n{SHARED_SCHEMA}")
}

/// Build the user prompt: event metadata, payload preview, prior attempts.
pub fn build_user_prompt(event: &WebhookEvent, prior: &[PriorAttempt]) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(&format!("Source: {}\n", event.source));
    prompt.push_str(&format!("Webhook ID: {}\n", event.webhook_id));
    prompt.push_str(&format!("Received: {}\n", event.timestamp.to_rfc3339()));

    if !prior.is_empty() {
        prompt.push_str("\nPrior attempts:\n");
        for (i, attempt) in prior.iter().enumerate() {
            prompt.push_str(&format!(
                "  [{}] {} said {} at confidence {:.2}: {}\n",
                i + 1,
                attempt.model,
                attempt.category,
                attempt.confidence,
                attempt.reasoning,
            ));
        }
    }

    let payload = event.payload.to_string();
    let preview: String = payload.chars().take(PAYLOAD_PREVIEW_CHARS).collect();
    prompt.push_str(&format!("\nPayload:\n{preview}"));

    prompt
}

/// Assemble the full message list for one tier attempt.
pub fn build_messages(tier: Tier, event: &WebhookEvent, prior: &[PriorAttempt]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(build_system_prompt(tier)),
        ChatMessage::user(build_user_prompt(event, prior)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventSource;
    use chrono::Utc;
    use serde_json::json;

    fn make_event(payload: serde_json::Value) -> WebhookEvent {
        WebhookEvent {
            source: EventSource::GitHub,
            webhook_id: "wh-1".into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    #[test]
    fn system_prompts_escalate_and_share_schema() {
        for tier in [Tier::Cheap, Tier::Standard, Tier::Premium] {
            let prompt = build_system_prompt(tier);
            assert!(prompt.contains("category"));
            assert!(prompt.contains("confidence"));
            assert!(prompt.contains("actions"));
        }
        assert!(build_system_prompt(Tier::Premium).contains("step by step"));
        assert_ne!(
            build_system_prompt(Tier::Cheap),
            build_system_prompt(Tier::Standard)
        );
    }

    #[test]
    fn user_prompt_includes_prior_attempts() {
        let event = make_event(json!({"action": "opened"}));
        let prior = vec![PriorAttempt {
            model: "gpt-4o-mini".into(),
            category: "task".into(),
            confidence: 0.4,
            reasoning: "ambiguous payload".into(),
        }];
        let prompt = build_user_prompt(&event, &prior);
        assert!(prompt.contains("Prior attempts"));
        assert!(prompt.contains("gpt-4o-mini"));
        assert!(prompt.contains("0.40"));
        assert!(prompt.contains("ambiguous payload"));
    }

    #[test]
    fn user_prompt_truncates_payload() {
        let event = make_event(json!({"blob": "x".repeat(5000)}));
        let prompt = build_user_prompt(&event, &[]);
        assert!(prompt.len() < 2500);
    }
}
