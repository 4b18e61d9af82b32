//! End-to-end event pipeline: classify a webhook event, then dispatch
//! it to the matching handler.

use tracing::{info, instrument};

use crate::classifier::TieredClassifier;
use crate::error::Error;
use crate::event::{ClassifiedEvent, WebhookEvent};
use crate::routing::{DispatchResult, Dispatcher};

/// Wires the tiered classifier to the dispatcher. Both collaborators are
/// injected so tests can substitute scripted providers and handlers.
pub struct EventPipeline {
    classifier: TieredClassifier,
    dispatcher: Dispatcher,
}

impl EventPipeline {
    pub fn new(classifier: TieredClassifier, dispatcher: Dispatcher) -> Self {
        Self {
            classifier,
            dispatcher,
        }
    }

    pub fn classifier(&self) -> &TieredClassifier {
        &self.classifier
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Classify and dispatch one webhook event.
    ///
    /// Classification failure (every tier exhausted) aborts the event;
    /// handler failure is reported inside the `DispatchResult` instead.
    #[instrument(skip(self, event), fields(webhook_id = %event.webhook_id, source = %event.source))]
    pub async fn process(&self, event: &WebhookEvent) -> Result<DispatchResult, Error> {
        let classification = self.classifier.classify(event).await?;
        info!(
            category = %classification.category,
            confidence = classification.confidence,
            tier = %classification.tier,
            escalated = classification.escalated,
            "Event classified"
        );

        let classified = ClassifiedEvent {
            event: event.clone(),
            classification,
        };
        let result = self.dispatcher.dispatch(&classified).await;
        info!(
            handler = %result.decision.handler,
            success = result.success,
            elapsed_ms = result.elapsed_ms,
            "Event dispatched"
        );
        Ok(result)
    }
}
