//! Shared types — behavior events emitted by the telemetry trackers toward
//! the configured analytics sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of behavior event produced by the trackers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorEventKind {
    ScrollDepth,
    Click,
    TimeOnPage,
}

/// A single analytics event handed to the sink. Emission is fire-and-forget;
/// transport (gtag, umami, server-side forwarding) lives behind an adaptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorEvent {
    pub event_id: Uuid,
    pub kind: BehaviorEventKind,
    /// Event category reported to the sink, e.g. "User Behavior".
    pub category: String,
    pub label: Option<String>,
    pub value: Option<i64>,
    pub session_id: String,
    pub page_path: String,
    pub properties: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
