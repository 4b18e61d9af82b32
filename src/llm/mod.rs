//! LLM integration — the external AI client boundary.
//!
//! The core only needs a single chat-completion call shape; retries and
//! backoff are the provider's concern. A reqwest-backed provider for
//! OpenAI-compatible chat-completions endpoints is included as the default
//! implementation.

pub mod openai;
pub mod provider;

pub use openai::OpenAiCompatProvider;
pub use provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};

use std::sync::Arc;

use secrecy::SecretString;

use crate::error::Result;

/// Configuration for creating the default LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat-completions base URL (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    pub api_key: SecretString,
}

/// Create the default OpenAI-compatible provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider = OpenAiCompatProvider::new(&config.base_url, config.api_key.clone())?;
    tracing::info!(base_url = %config.base_url, "Using OpenAI-compatible provider");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_yields_a_named_provider() {
        let config = LlmConfig {
            base_url: "https://api.example.com/v1/".into(),
            api_key: SecretString::from("sk-test"),
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai-compat");
    }
}
