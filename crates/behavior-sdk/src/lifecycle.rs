//! Page lifecycle recorder — entry context, heartbeat time-on-page, and the
//! leave merge at route changes and shutdown.

use std::sync::Arc;

use tracing::debug;

use freemium_core::event_bus::{make_event, EventSink};
use freemium_core::types::BehaviorEventKind;

use crate::clock::Clock;
use crate::store::{BehaviorStore, PageUpdate};

/// Heartbeat cadence for time-on-page updates.
pub const HEARTBEAT_INTERVAL_MS: i64 = 10_000;

/// Time-on-page events below this threshold are considered bounce noise and
/// not emitted to the sink (the store merge still happens).
pub const TIME_ON_PAGE_EMIT_THRESHOLD_MS: i64 = 5_000;

/// Page environment captured at mount, as reported by the host shell.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user_agent: String,
    pub referrer: Option<String>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub language: String,
    pub do_not_track: bool,
    pub has_performance_api: bool,
    pub has_connection_api: bool,
}

impl PageContext {
    /// Viewport rendered the way the blob stores it, e.g. `1440x900`.
    pub fn viewport(&self) -> String {
        format!("{}x{}", self.viewport_width, self.viewport_height)
    }
}

pub struct PageLifecycle {
    entry_time: i64,
    session_id: String,
    store: Arc<BehaviorStore>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl PageLifecycle {
    pub fn new(
        session_id: String,
        store: Arc<BehaviorStore>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let entry_time = clock.now_ms();
        Self {
            entry_time,
            session_id,
            store,
            sink,
            clock,
        }
    }

    /// Record the mount-time page environment.
    pub fn record_entry(&self, path: &str, ctx: &PageContext) {
        self.store.merge_page_data(
            &self.session_id,
            path,
            PageUpdate::Entry {
                entry_time: self.entry_time,
                user_agent: ctx.user_agent.clone(),
                referrer: ctx.referrer.clone(),
                viewport: ctx.viewport(),
                language: ctx.language.clone(),
            },
        );
    }

    /// Periodic time-on-page update, independent of navigation.
    pub fn heartbeat(&self, path: &str) {
        let now = self.clock.now_ms();
        self.store.merge_page_data(
            &self.session_id,
            path,
            PageUpdate::Heartbeat {
                time_on_page: round_to_seconds(now - self.entry_time),
                last_active_time: now,
            },
        );
    }

    /// Leave merge for route changes and shutdown. Emits a time-on-page
    /// event only for visits longer than the bounce threshold.
    pub fn record_leave(&self, path: &str, max_scroll_depth: u32, click_count: u32) {
        let now = self.clock.now_ms();
        let spent_ms = now - self.entry_time;
        let spent_secs = round_to_seconds(spent_ms);

        self.store.merge_page_data(
            &self.session_id,
            path,
            PageUpdate::Leave {
                time_on_page: spent_secs,
                max_scroll_depth,
                click_count,
                leave_time: now,
            },
        );

        if spent_ms > TIME_ON_PAGE_EMIT_THRESHOLD_MS {
            self.sink.emit(make_event(
                BehaviorEventKind::TimeOnPage,
                self.session_id.clone(),
                path,
                Some(path.to_string()),
                Some(spent_secs),
            ));
        }
        debug!(path, spent_secs, "page leave recorded");
    }

    /// Route-change boundary: the next page view starts timing now.
    pub fn reset(&mut self) {
        self.entry_time = self.clock.now_ms();
    }

    pub fn entry_time(&self) -> i64 {
        self.entry_time
    }
}

fn round_to_seconds(ms: i64) -> i64 {
    (ms as f64 / 1000.0).round() as i64
}
