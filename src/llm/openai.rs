//! OpenAI-compatible chat-completions provider over reqwest.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, TokenUsage,
};

const PROVIDER_NAME: &str = "openai-compat";

/// Provider for any endpoint speaking the OpenAI chat-completions shape.
pub struct OpenAiCompatProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    /// Per-model (prompt, completion) cost per 1k tokens. Models absent
    /// from the table report zero cost.
    pricing: HashMap<String, (Decimal, Decimal)>,
}

#[derive(serde::Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().build().map_err(|e| {
            LlmError::RequestFailed {
                provider: PROVIDER_NAME.into(),
                reason: format!("failed to build HTTP client: {e}"),
            }
        })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            pricing: HashMap::new(),
        })
    }

    /// Attach a per-model pricing table so responses carry real costs.
    pub fn with_pricing(mut self, pricing: HashMap<String, (Decimal, Decimal)>) -> Self {
        self.pricing = pricing;
        self
    }

    fn cost_for(&self, model: &str, usage: &WireUsage) -> Decimal {
        match self.pricing.get(model) {
            Some((prompt_rate, completion_rate)) => {
                let per_k = Decimal::from(1000u32);
                Decimal::from(usage.prompt_tokens) * *prompt_rate / per_k
                    + Decimal::from(usage.completion_tokens) * *completion_rate / per_k
            }
            None => Decimal::ZERO,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = WireRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER_NAME.into(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER_NAME.into(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                provider: PROVIDER_NAME.into(),
                retry_after: None,
            });
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER_NAME.into(),
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let wire: WireResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    provider: PROVIDER_NAME.into(),
                    reason: e.to_string(),
                })?;

        let content = wire
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: PROVIDER_NAME.into(),
                reason: "response contained no choices".into(),
            })?;

        let usage = wire.usage.unwrap_or(WireUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
        });
        let cost = self.cost_for(&request.model, &usage);

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                cost,
            },
        })
    }
}
