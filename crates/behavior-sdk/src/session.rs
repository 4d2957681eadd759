//! Session identity — a stable per-tab identifier kept in session-scoped
//! storage. When storage is denied, the identifier degrades to a fresh
//! in-memory value for that call only.

use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::storage::KvStorage;

/// Storage key for the session id: `{prefix}sessionId` with a `_` joiner when
/// the prefix lacks a trailing underscore, or bare `sessionId` without prefix.
pub fn session_key(prefix: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return "sessionId".to_string();
    }
    if prefix.ends_with('_') {
        format!("{prefix}sessionId")
    } else {
        format!("{prefix}_sessionId")
    }
}

/// Generate a new opaque session identifier: hex timestamp plus random
/// suffix. URL and JSON safe, practically unique across concurrent tabs.
pub fn generate_session_id(now_ms: i64) -> String {
    format!("{:x}{}", now_ms.max(0), Uuid::new_v4().simple())
}

/// Fetch the stored session id, creating and persisting one if absent.
pub fn session_id(storage: &dyn KvStorage, prefix: &str, clock: &dyn Clock) -> String {
    let key = session_key(prefix);

    match storage.get(&key) {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            let id = generate_session_id(clock.now_ms());
            if let Err(e) = storage.set(&key, &id) {
                debug!(error = %e, "session id not persisted");
            }
            id
        }
        Err(e) => {
            debug!(error = %e, "session storage unavailable, using transient id");
            generate_session_id(clock.now_ms())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::{FailingStorage, MemoryStorage};

    #[test]
    fn test_session_key_forms() {
        assert_eq!(session_key(""), "sessionId");
        assert_eq!(session_key("  "), "sessionId");
        assert_eq!(session_key("freemium_analytics_"), "freemium_analytics_sessionId");
        assert_eq!(session_key("blog"), "blog_sessionId");
        assert_eq!(
            session_key("freemium_analytics_userBehavior"),
            "freemium_analytics_userBehavior_sessionId"
        );
    }

    #[test]
    fn test_session_id_is_stable() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(1_700_000_000_000);

        let first = session_id(&storage, "freemium_analytics_", &clock);
        clock.advance(42);
        let second = session_id(&storage, "freemium_analytics_", &clock);
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_id_returned_verbatim() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(0);
        storage.set("sessionId", "prior-session").unwrap();
        assert_eq!(session_id(&storage, "", &clock), "prior-session");
    }

    #[test]
    fn test_failing_storage_yields_transient_ids() {
        let storage = FailingStorage;
        let clock = ManualClock::new(1_700_000_000_000);

        let first = session_id(&storage, "p_", &clock);
        let second = session_id(&storage, "p_", &clock);
        assert!(!first.is_empty());
        // Transient ids are regenerated per call, not reused.
        assert_ne!(first, second);
    }

    #[test]
    fn test_generated_id_is_url_safe() {
        let id = generate_session_id(1_700_000_000_000);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
