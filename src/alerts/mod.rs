//! Heuristic alert classification.
//!
//! Assigns a P0–P3 priority to alerts derived from emails and calendar
//! events. No LLM involved — priorities come from cheap signal rules, and
//! every fired rule is recorded in the alert's `signals` list for
//! transparency in the rendered message.

pub mod classifier;
pub mod types;

pub use classifier::AlertClassifier;
pub use types::{AlertLevel, AlertSource, CalendarItem, ClassifiedAlert, EmailItem};
