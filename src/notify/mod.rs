//! Notification routing and delivery scheduling.
//!
//! Alerts reach the user on one of three paths decided by priority:
//! immediate send (P0 always, P1 outside quiet hours), the quiet-hours
//! queue (P1 during quiet hours), or the P2 batch digest. P3 alerts are
//! logged and never sent.

pub mod digest;
pub mod queue;
pub mod router;

pub use digest::{format_digest, render_alert};
pub use queue::{AlertQueue, QueuedNotification};
pub use router::{DeliveryChannel, DeliveryResult, NotificationRouter, NotificationSender};
