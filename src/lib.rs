//! Event Triage — webhook classification, routing, and alert delivery core.

pub mod alerts;
pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod llm;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod routing;
