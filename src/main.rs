use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use event_triage::classifier::{ClassificationCache, TieredClassifier};
use event_triage::config::ClassifierConfig;
use event_triage::error::RoutingError;
use event_triage::event::{ClassifiedEvent, WebhookEvent};
use event_triage::llm::{LlmConfig, create_provider};
use event_triage::metrics::TracingSink;
use event_triage::pipeline::EventPipeline;
use event_triage::routing::{
    Dispatcher, Handler, HandlerName, HandlerOutcome, HandlerRegistry, RoutingRules,
};

/// Placeholder handler that logs the events it receives. Real deployments
/// register their own handlers against the registry.
struct LoggingHandler {
    name: &'static str,
}

#[async_trait]
impl Handler for LoggingHandler {
    async fn handle(&self, event: &ClassifiedEvent) -> Result<HandlerOutcome, RoutingError> {
        tracing::info!(
            handler = self.name,
            webhook_id = %event.event.webhook_id,
            category = %event.classification.category,
            "Handled event"
        );
        Ok(HandlerOutcome::ok(format!("logged by {}", self.name)))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Read API key from environment
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| {
        eprintln!("Error: OPENAI_API_KEY not set");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    let base_url = std::env::var("EVENT_TRIAGE_BASE_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

    let mut classifier_config = ClassifierConfig::default();
    if let Ok(ttl) = std::env::var("EVENT_TRIAGE_CACHE_TTL_SECS")
        && let Ok(secs) = ttl.parse::<u64>()
    {
        classifier_config.cache_ttl = Duration::from_secs(secs);
    }

    eprintln!("Event Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Endpoint: {base_url}");
    eprintln!(
        "   Tiers: {} -> {} -> {}",
        classifier_config.cheap.model,
        classifier_config.standard.model,
        classifier_config.premium.model
    );
    eprintln!("   Reading webhook JSON (one event per line) from stdin.\n");

    let llm_config = LlmConfig {
        base_url,
        api_key: secrecy::SecretString::from(api_key),
    };
    let provider = create_provider(&llm_config)?;

    let metrics = Arc::new(TracingSink);
    let cache = Arc::new(ClassificationCache::new(classifier_config.cache_ttl));
    let classifier = TieredClassifier::new(provider, cache, classifier_config, metrics.clone());

    let registry = Arc::new(HandlerRegistry::new());
    for name in ["scheduler", "notifier", "orchestrator"] {
        registry
            .register(HandlerName::new(name), Arc::new(LoggingHandler { name }))
            .await;
    }

    let dispatcher = Dispatcher::new(RoutingRules::with_defaults(), registry, metrics);
    let pipeline = EventPipeline::new(classifier, dispatcher);

    // One webhook event per stdin line; malformed lines are reported and
    // skipped, classification failures abort only that event.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event: WebhookEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed event line");
                continue;
            }
        };
        match pipeline.process(&event).await {
            Ok(result) => {
                println!(
                    "{}",
                    serde_json::json!({
                        "webhook_id": event.webhook_id,
                        "handler": result.decision.handler,
                        "success": result.success,
                        "elapsed_ms": result.elapsed_ms,
                    })
                );
            }
            Err(e) => {
                tracing::error!(webhook_id = %event.webhook_id, error = %e, "Event failed");
            }
        }
    }

    Ok(())
}
