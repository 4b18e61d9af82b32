//! Pre-flight cost estimation.
//!
//! `estimate_cost` is a pure function used for budgeting before any
//! classification happens — it never drives control flow.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::classifier::types::Tier;
use crate::config::{ClassifierConfig, TierConfig};
use crate::event::WebhookEvent;

/// Rough chars-per-token ratio for payload text.
const CHARS_PER_TOKEN: usize = 4;
/// Prompt scaffolding (system prompt + metadata) in tokens.
const PROMPT_OVERHEAD_TOKENS: usize = 300;
/// Assumed completion length for a triage response.
const COMPLETION_TOKENS: usize = 200;

/// Probability that classification resolves at each tier.
const P_CHEAP: Decimal = dec!(0.90);
const P_STANDARD: Decimal = dec!(0.09);
const P_PREMIUM: Decimal = dec!(0.01);

/// Cost envelope for classifying one event.
#[derive(Debug, Clone)]
pub struct CostEstimate {
    /// Cheap tier resolves immediately.
    pub min_cost: Decimal,
    /// Every tier is attempted.
    pub max_cost: Decimal,
    /// Probability-weighted mixture over resolution depth.
    pub expected_cost: Decimal,
    /// Single-call cost per tier.
    pub per_tier: Vec<(Tier, Decimal)>,
}

/// Estimate the classification cost for an event without classifying it.
pub fn estimate_cost(event: &WebhookEvent, config: &ClassifierConfig) -> CostEstimate {
    let payload_tokens = event.payload.to_string().len() / CHARS_PER_TOKEN;
    let prompt_tokens = payload_tokens + PROMPT_OVERHEAD_TOKENS;

    let cheap = tier_call_cost(&config.cheap, prompt_tokens);
    let standard = tier_call_cost(&config.standard, prompt_tokens);
    let premium = tier_call_cost(&config.premium, prompt_tokens);

    // Escalation is cumulative: resolving at standard pays cheap too.
    let expected = P_CHEAP * cheap
        + P_STANDARD * (cheap + standard)
        + P_PREMIUM * (cheap + standard + premium);

    CostEstimate {
        min_cost: cheap,
        max_cost: cheap + standard + premium,
        expected_cost: expected,
        per_tier: vec![
            (Tier::Cheap, cheap),
            (Tier::Standard, standard),
            (Tier::Premium, premium),
        ],
    }
}

fn tier_call_cost(tier: &TierConfig, prompt_tokens: usize) -> Decimal {
    let per_k = Decimal::from(1000u32);
    Decimal::from(prompt_tokens as u64) * tier.prompt_cost_per_1k / per_k
        + Decimal::from(COMPLETION_TOKENS as u64) * tier.completion_cost_per_1k / per_k
}
