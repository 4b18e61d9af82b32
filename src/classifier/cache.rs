//! Classification cache — content-fingerprint keyed, TTL-expired.
//!
//! Keys are a SHA-256 digest of `{source, key_fields}` where the key-field
//! subset depends on the source. Two structurally-equal payloads for the
//! same source hash identically regardless of JSON field order
//! (serde_json's map ordering is deterministic).

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

use crate::classifier::types::ClassificationResult;
use crate::event::{EventSource, WebhookEvent};

/// A cached classification with its expiry.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: ClassificationResult,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Cache statistics snapshot.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl: Duration,
}

/// TTL cache for classification results, safe under concurrent event
/// handling. Hit/miss counters are monotonic and reset only by `clear()`.
pub struct ClassificationCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    ttl: Duration,
}

impl ClassificationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            ttl,
        }
    }

    /// Look up a cached result. Expired entries are deleted lazily here
    /// and count as misses.
    pub async fn get(&self, event: &WebhookEvent) -> Option<ClassificationResult> {
        let key = fingerprint(event);
        let now = Utc::now();

        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(webhook_id = %event.webhook_id, "Classification cache hit");
                    return Some(entry.result.clone());
                }
                Some(_) => {} // expired — fall through to remove
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key)
            && entry.is_expired(now)
        {
            entries.remove(&key);
            debug!(webhook_id = %event.webhook_id, "Evicted expired cache entry");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a result keyed by the event's fingerprint.
    pub async fn set(&self, event: &WebhookEvent, result: ClassificationResult) {
        let key = fingerprint(event);
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::seconds(300));
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { result, expires_at });
    }

    /// Proactively purge expired entries. Returns how many were removed.
    pub async fn cleanup(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Drop all entries and reset hit/miss counters.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub async fn stats(&self) -> CacheStats {
        let size = self.entries.read().await.len();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        CacheStats {
            size,
            hits,
            misses,
            hit_rate,
            ttl: self.ttl,
        }
    }
}

// ── Fingerprinting ──────────────────────────────────────────────────

/// Stable content fingerprint for an event.
pub fn fingerprint(event: &WebhookEvent) -> String {
    let key_fields = extract_key_fields(&event.source, &event.payload);
    // serde_json maps serialize with sorted keys, so this is deterministic
    // across field orderings of the inbound payload.
    let canonical = json!({
        "source": event.source.as_str(),
        "key_fields": key_fields,
    });
    let serialized = canonical.to_string();

    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Source-specific key-field subset. Unknown sources hash the whole
/// payload.
fn extract_key_fields(source: &EventSource, payload: &Value) -> Value {
    match source {
        EventSource::GitHub => json!({
            "action": payload.get("action").cloned().unwrap_or(Value::Null),
            "repository": payload
                .pointer("/repository/full_name")
                .cloned()
                .unwrap_or(Value::Null),
            "issue": payload.pointer("/issue/number").cloned().unwrap_or(Value::Null),
            "pull_request": payload
                .pointer("/pull_request/number")
                .cloned()
                .unwrap_or(Value::Null),
            "sender": payload.pointer("/sender/login").cloned().unwrap_or(Value::Null),
        }),
        EventSource::Calendar => json!({
            "kind": payload.get("kind").cloned().unwrap_or(Value::Null),
            "summary": payload.get("summary").cloned().unwrap_or(Value::Null),
            "start": payload.get("start").cloned().unwrap_or(Value::Null),
            "end": payload.get("end").cloned().unwrap_or(Value::Null),
        }),
        EventSource::Email => json!({
            "from": payload.get("from").cloned().unwrap_or(Value::Null),
            "subject": payload.get("subject").cloned().unwrap_or(Value::Null),
            "message_id": payload.get("message_id").cloned().unwrap_or(Value::Null),
        }),
        EventSource::Other(_) => payload.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventAction, EventCategory};
    use crate::classifier::types::Tier;
    use rust_decimal::Decimal;

    fn make_event(source: EventSource, payload: Value) -> WebhookEvent {
        WebhookEvent {
            source,
            webhook_id: "wh-1".into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    fn make_result() -> ClassificationResult {
        ClassificationResult {
            category: EventCategory::Task,
            confidence: 0.9,
            actions: vec![EventAction::Review],
            tier: Tier::Cheap,
            model: "gpt-4o-mini".into(),
            cost: Decimal::ZERO,
            reasoning: "test".into(),
            escalated: false,
            escalation_path: vec!["gpt-4o-mini".into()],
        }
    }

    #[test]
    fn fingerprint_ignores_field_order() {
        let a = make_event(
            EventSource::GitHub,
            serde_json::from_str(
                r#"{"action": "opened", "repository": {"full_name": "org/repo"}, "sender": {"login": "alice"}}"#,
            )
            .unwrap(),
        );
        let b = make_event(
            EventSource::GitHub,
            serde_json::from_str(
                r#"{"sender": {"login": "alice"}, "action": "opened", "repository": {"full_name": "org/repo"}}"#,
            )
            .unwrap(),
        );
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_ignores_non_key_fields() {
        let a = make_event(
            EventSource::GitHub,
            json!({"action": "opened", "sender": {"login": "alice"}, "extra": 1}),
        );
        let b = make_event(
            EventSource::GitHub,
            json!({"action": "opened", "sender": {"login": "alice"}, "extra": 2}),
        );
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_distinguishes_sources() {
        let a = make_event(EventSource::Calendar, json!({"summary": "standup"}));
        let b = make_event(
            EventSource::Other("custom".into()),
            json!({"summary": "standup"}),
        );
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn unknown_source_uses_whole_payload() {
        let a = make_event(EventSource::Other("jira".into()), json!({"k": 1}));
        let b = make_event(EventSource::Other("jira".into()), json!({"k": 2}));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[tokio::test]
    async fn set_then_get_returns_result() {
        let cache = ClassificationCache::new(Duration::from_secs(300));
        let event = make_event(EventSource::Calendar, json!({"summary": "standup"}));

        cache.set(&event, make_result()).await;
        let got = cache.get(&event).await.expect("cached result");
        assert_eq!(got.category, EventCategory::Task);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.size, 1);
    }

    #[tokio::test]
    async fn expired_entry_is_never_returned() {
        let cache = ClassificationCache::new(Duration::ZERO);
        let event = make_event(EventSource::Calendar, json!({"summary": "standup"}));

        cache.set(&event, make_result()).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.get(&event).await.is_none());
        // Lazy eviction removed the entry.
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn cleanup_purges_expired() {
        let cache = ClassificationCache::new(Duration::ZERO);
        let a = make_event(EventSource::Calendar, json!({"summary": "a"}));
        let b = make_event(EventSource::Calendar, json!({"summary": "b"}));
        cache.set(&a, make_result()).await;
        cache.set(&b, make_result()).await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.cleanup().await, 2);
        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn clear_resets_counters() {
        let cache = ClassificationCache::new(Duration::from_secs(300));
        let event = make_event(EventSource::Calendar, json!({"summary": "x"}));
        assert!(cache.get(&event).await.is_none());
        cache.set(&event, make_result()).await;
        cache.get(&event).await;

        cache.clear().await;
        let stats = cache.stats().await;
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[tokio::test]
    async fn hit_rate_reflects_counters() {
        let cache = ClassificationCache::new(Duration::from_secs(300));
        let event = make_event(EventSource::Calendar, json!({"summary": "x"}));
        cache.get(&event).await; // miss
        cache.set(&event, make_result()).await;
        cache.get(&event).await; // hit

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }
}
