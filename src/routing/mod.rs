//! Routing — rules engine, handler registry, and dispatcher.
//!
//! A classified event flows through:
//! 1. `RoutingRules::find_matching_rule()` — priority-ordered custom rules,
//!    then per-category defaults
//! 2. `HandlerRegistry` lookup — unregistered handlers silently fall back
//!    to the generalist orchestrator
//! 3. `Dispatcher::dispatch()` — invokes the handler, never propagates
//!    handler failures

pub mod dispatcher;
pub mod registry;
pub mod rules;

pub use dispatcher::{DispatchResult, Dispatcher, RoutingDecision};
pub use registry::{Handler, HandlerName, HandlerOutcome, HandlerRegistry};
pub use rules::{ConditionOp, RouteCondition, RouteConfig, RoutingRules};
