//! Unified event bus — trait for emitting behavior events from any tracker.
//!
//! Trackers accept an `Arc<dyn EventSink>` and emit fire-and-forget events.
//! A missing third-party analytics global is modeled by the no-op sink.

use crate::types::{BehaviorEvent, BehaviorEventKind};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Trait for emitting behavior events. Implementations route events to
/// third-party analytics (gtag, umami) via adaptors, or capture them in tests.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BehaviorEvent);
}

/// No-op sink for tests and hosts without an analytics global.
pub struct NoOpSink;

impl EventSink for NoOpSink {
    fn emit(&self, _event: BehaviorEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<BehaviorEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<BehaviorEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_kind(&self, kind: BehaviorEventKind) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("event bus mutex poisoned").clear();
    }
}

impl EventSink for CaptureSink {
    fn emit(&self, event: BehaviorEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Convenience builder for creating `BehaviorEvent` with minimal boilerplate.
pub fn make_event(
    kind: BehaviorEventKind,
    session_id: impl Into<String>,
    page_path: impl Into<String>,
    label: Option<String>,
    value: Option<i64>,
) -> BehaviorEvent {
    BehaviorEvent {
        event_id: Uuid::new_v4(),
        kind,
        category: "User Behavior".into(),
        label,
        value,
        session_id: session_id.into(),
        page_path: page_path.into(),
        properties: HashMap::new(),
        timestamp: Utc::now(),
    }
}

/// Convenience: create a no-op sink for hosts without analytics.
pub fn noop_sink() -> Arc<dyn EventSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
