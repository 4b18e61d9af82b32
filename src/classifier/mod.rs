//! Tiered event classification.
//!
//! Flow for one event:
//! 1. `ClassificationCache` lookup — a hit returns with no model call
//! 2. Cheap tier — accepted at confidence ≥ thresholds.standard
//! 3. Standard tier — accepted at confidence ≥ thresholds.premium,
//!    prompted with the prior attempt(s) as context
//! 4. Premium tier — terminal, its result is returned regardless of
//!    its own confidence
//!
//! A tier's transport/parse/timeout failure escalates silently; only a
//! premium-tier failure surfaces to the caller.

pub mod cache;
pub mod cost;
mod prompts;
pub mod tiered;
mod types;

pub use cache::{CacheStats, ClassificationCache};
pub use cost::{CostEstimate, estimate_cost};
pub use tiered::TieredClassifier;
pub use types::{ClassificationResult, Tier};
