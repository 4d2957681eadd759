//! Behavior store — per-session page metrics persisted as one JSON blob in
//! the local storage scope. Every merge is a full read-modify-write with
//! retention pruning applied before persisting; the post-prune mapping is
//! returned so the caller can reflect it immediately.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clicks::ClickDetail;
use crate::clock::Clock;
use crate::storage::KvStorage;

const DAY_MS: i64 = 86_400_000;

pub type StoreMap = HashMap<String, SessionRecord>;

/// One browser session's worth of recorded behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub start_time: i64,
    #[serde(default)]
    pub pages: HashMap<String, PageRecord>,
}

/// Metrics recorded for one page path within a session. Fields are written
/// by independent trackers; each update touches only its own fields
/// (shallow merge, last write wins per field).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scroll_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_scroll_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_click: Option<ClickDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_on_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub became_active_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub became_inactive_at: Option<i64>,
}

/// Partial update merged into a `PageRecord`. One variant per tracker write
/// site, reduced by [`PageRecord::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageUpdate {
    Entry {
        entry_time: i64,
        user_agent: String,
        referrer: Option<String>,
        viewport: String,
        language: String,
    },
    Scroll {
        max_scroll_depth: u32,
        last_scroll_time: i64,
    },
    Click {
        click_count: u32,
        last_click: ClickDetail,
    },
    Heartbeat {
        time_on_page: i64,
        last_active_time: i64,
    },
    Leave {
        time_on_page: i64,
        max_scroll_depth: u32,
        click_count: u32,
        leave_time: i64,
    },
    BecameActive {
        at: i64,
    },
    BecameInactive {
        at: i64,
    },
}

impl PageRecord {
    /// Reduce an update into the record. Untouched fields are preserved.
    pub fn apply(&mut self, update: PageUpdate) {
        match update {
            PageUpdate::Entry {
                entry_time,
                user_agent,
                referrer,
                viewport,
                language,
            } => {
                self.entry_time = Some(entry_time);
                self.user_agent = Some(user_agent);
                self.referrer = referrer;
                self.viewport = Some(viewport);
                self.language = Some(language);
            }
            PageUpdate::Scroll {
                max_scroll_depth,
                last_scroll_time,
            } => {
                self.max_scroll_depth = Some(max_scroll_depth);
                self.last_scroll_time = Some(last_scroll_time);
            }
            PageUpdate::Click {
                click_count,
                last_click,
            } => {
                self.click_count = Some(click_count);
                self.last_click = Some(last_click);
            }
            PageUpdate::Heartbeat {
                time_on_page,
                last_active_time,
            } => {
                self.time_on_page = Some(time_on_page);
                self.last_active_time = Some(last_active_time);
            }
            PageUpdate::Leave {
                time_on_page,
                max_scroll_depth,
                click_count,
                leave_time,
            } => {
                self.time_on_page = Some(time_on_page);
                self.max_scroll_depth = Some(max_scroll_depth);
                self.click_count = Some(click_count);
                self.leave_time = Some(leave_time);
            }
            PageUpdate::BecameActive { at } => {
                self.became_active_at = Some(at);
            }
            PageUpdate::BecameInactive { at } => {
                self.became_inactive_at = Some(at);
            }
        }
    }
}

/// Drop sessions older than the retention window. `retention_days <= 0`
/// disables pruning entirely.
pub fn prune_expired(store: &mut StoreMap, retention_days: i64, now_ms: i64) {
    if retention_days <= 0 {
        return;
    }
    let cutoff = now_ms - retention_days * DAY_MS;
    let before = store.len();
    store.retain(|_, session| session.start_time >= cutoff);
    if store.len() < before {
        debug!(
            dropped = before - store.len(),
            retention_days, "pruned expired sessions"
        );
    }
}

/// Reads, merges and prunes the persisted behavior blob.
pub struct BehaviorStore {
    storage: Arc<dyn KvStorage>,
    clock: Arc<dyn Clock>,
    storage_key: String,
    retention_days: i64,
}

impl BehaviorStore {
    pub fn new(
        storage: Arc<dyn KvStorage>,
        clock: Arc<dyn Clock>,
        storage_key: String,
        retention_days: i64,
    ) -> Self {
        Self {
            storage,
            clock,
            storage_key,
            retention_days,
        }
    }

    /// Merge a partial update into `(session_id, path)`, prune, persist, and
    /// return the post-prune mapping. Never fails: unreadable or malformed
    /// state degrades to an empty store, unwritable storage costs only
    /// persistence of this call.
    pub fn merge_page_data(&self, session_id: &str, path: &str, update: PageUpdate) -> StoreMap {
        let now = self.clock.now_ms();
        let mut store = self.load();

        let session = store
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord {
                start_time: now,
                pages: HashMap::new(),
            });
        let page = session
            .pages
            .entry(path.to_string())
            .or_insert_with(|| PageRecord {
                start_time: Some(now),
                ..PageRecord::default()
            });
        page.apply(update);

        prune_expired(&mut store, self.retention_days, now);
        self.persist(&store);
        store
    }

    /// Current store contents. Blob parse failure yields an empty map;
    /// individual entries that fail to decode (missing or non-numeric
    /// `startTime`) are dropped unconditionally.
    pub fn load(&self) -> StoreMap {
        let blob = match self.storage.get(&self.storage_key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return StoreMap::new(),
            Err(e) => {
                debug!(error = %e, "behavior store unreadable");
                return StoreMap::new();
            }
        };

        let raw: HashMap<String, serde_json::Value> = match serde_json::from_str(&blob) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "behavior store blob malformed, starting empty");
                return StoreMap::new();
            }
        };

        raw.into_iter()
            .filter_map(|(id, value)| {
                match serde_json::from_value::<SessionRecord>(value) {
                    Ok(session) => Some((id, session)),
                    Err(e) => {
                        debug!(session_id = %id, error = %e, "dropping malformed session entry");
                        None
                    }
                }
            })
            .collect()
    }

    fn persist(&self, store: &StoreMap) {
        let blob = match serde_json::to_string(store) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "behavior store not serializable");
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.storage_key, &blob) {
            warn!(error = %e, "behavior store write failed");
        }
    }
}
