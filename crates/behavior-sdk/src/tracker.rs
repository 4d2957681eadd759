//! Behavior tracker coordinator — wires the session identity, store and the
//! per-page trackers together, fans host signals out to them, and owns the
//! page-view lifecycle: mount, route changes, timed ticks, and an
//! idempotent shutdown.

use std::sync::Arc;

use tracing::{debug, info};

use freemium_core::config::BehaviorConfig;
use freemium_core::event_bus::EventSink;

use crate::activity::{check_interval_ms, ActivityMonitor, ActivitySignal};
use crate::capabilities::Capabilities;
use crate::clicks::{ClickKind, ClickTracker};
use crate::clock::Clock;
use crate::lifecycle::{PageContext, PageLifecycle, HEARTBEAT_INTERVAL_MS};
use crate::scroll::ScrollTracker;
use crate::session;
use crate::storage::StorageScopes;
use crate::store::{BehaviorStore, StoreMap};

/// Teardown handle for a host-side resource (listener registration, timer).
/// The wrapped action runs at most once, on `dispose` or drop.
pub struct Disposer {
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    pub fn dispose(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.dispose();
    }
}

struct Inner {
    path: String,
    session_id: String,
    capabilities: Capabilities,
    store: Arc<BehaviorStore>,
    scroll: ScrollTracker,
    clicks: ClickTracker,
    activity: ActivityMonitor,
    lifecycle: PageLifecycle,
    clock: Arc<dyn Clock>,
    heartbeat_due: i64,
    activity_check_due: i64,
    activity_check_interval: i64,
}

/// The top-level tracker. Inert (every method a no-op) when tracking is
/// disabled or the visitor opted out via Do-Not-Track; otherwise all state
/// lives in this instance, never in module-level globals.
pub struct BehaviorTracker {
    inner: Option<Inner>,
    disposers: Vec<Disposer>,
}

impl BehaviorTracker {
    /// Establish the session and record page entry. No public entry point on
    /// the returned tracker panics or propagates an error, even with storage
    /// backends that fail every call.
    pub fn mount(
        config: &BehaviorConfig,
        scopes: StorageScopes,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        path: &str,
        ctx: &PageContext,
    ) -> Self {
        if !config.enable_tracking {
            debug!("behavior tracking disabled");
            return Self::inert();
        }
        if config.respect_dnt && ctx.do_not_track {
            info!("visitor sent Do-Not-Track, behavior tracking inert");
            return Self::inert();
        }

        let capabilities = Capabilities::probe(&scopes, ctx);
        // The session key is namespaced under the full store key, not just the
        // configured prefix: `{prefix}userBehavior_sessionId`.
        let storage_key = config.storage_key();
        let session_id = session::session_id(scopes.session.as_ref(), &storage_key, clock.as_ref());

        let store = Arc::new(BehaviorStore::new(
            scopes.local.clone(),
            clock.clone(),
            storage_key.clone(),
            config.retention_days,
        ));

        let scroll = ScrollTracker::new(
            config.scroll_milestones.normalize(),
            storage_key,
            session_id.clone(),
            scopes.session.clone(),
            capabilities.has_session_storage,
            store.clone(),
            sink.clone(),
            clock.clone(),
        );
        let clicks = ClickTracker::new(
            config.click_selectors.normalize(),
            session_id.clone(),
            store.clone(),
            sink.clone(),
            clock.clone(),
        );
        let activity = ActivityMonitor::new(
            config.inactivity_timeout_ms,
            session_id.clone(),
            store.clone(),
            clock.clone(),
        );
        let lifecycle = PageLifecycle::new(session_id.clone(), store.clone(), sink, clock.clone());
        lifecycle.record_entry(path, ctx);

        let now = clock.now_ms();
        let activity_check_interval = check_interval_ms(config.inactivity_timeout_ms) as i64;
        info!(session_id = %session_id, path, "behavior tracker mounted");

        Self {
            inner: Some(Inner {
                path: path.to_string(),
                session_id,
                capabilities,
                store,
                scroll,
                clicks,
                activity,
                lifecycle,
                clock: clock.clone(),
                heartbeat_due: now + HEARTBEAT_INTERVAL_MS,
                activity_check_due: now + activity_check_interval,
                activity_check_interval,
            }),
            disposers: Vec::new(),
        }
    }

    fn inert() -> Self {
        Self {
            inner: None,
            disposers: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.inner.as_ref().map(|inner| inner.session_id.as_str())
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.inner.as_ref().map(|inner| inner.capabilities)
    }

    /// Current post-prune store contents, for dashboard reflection.
    pub fn store_snapshot(&self) -> StoreMap {
        self.inner
            .as_ref()
            .map(|inner| inner.store.load())
            .unwrap_or_default()
    }

    /// Host scroll signal with current geometry. Doubles as an activity
    /// signal, as scrolling is interaction.
    pub fn on_scroll(&mut self, scroll_top: f64, viewport_height: f64, document_height: f64) {
        if let Some(inner) = self.inner.as_mut() {
            inner.activity.on_signal(&inner.path, ActivitySignal::Scroll);
            inner
                .scroll
                .on_scroll(&inner.path, scroll_top, viewport_height, document_height);
        }
    }

    /// Host click signal. Returns the classification when the click was
    /// tracked.
    pub fn on_click(&mut self, target: &crate::selectors::ClickTarget) -> Option<ClickKind> {
        let inner = self.inner.as_mut()?;
        inner
            .activity
            .on_signal(&inner.path, ActivitySignal::PointerDown);
        inner.clicks.on_click(&inner.path, target)
    }

    /// Non-click interaction signal (pointer move, keypress, touch).
    pub fn on_activity(&mut self, signal: ActivitySignal) {
        if let Some(inner) = self.inner.as_mut() {
            inner.activity.on_signal(&inner.path, signal);
        }
    }

    /// Timer callback from the host loop. Drives the 10 s heartbeat and the
    /// inactivity check off the injected clock; safe to call at any cadence.
    pub fn tick(&mut self) {
        if let Some(inner) = self.inner.as_mut() {
            let now = inner.clock.now_ms();
            if now >= inner.heartbeat_due {
                inner.lifecycle.heartbeat(&inner.path);
                inner.heartbeat_due = now + HEARTBEAT_INTERVAL_MS;
            }
            if now >= inner.activity_check_due {
                inner.activity.check(&inner.path);
                inner.activity_check_due = now + inner.activity_check_interval;
            }
        }
    }

    /// Route-change boundary: record the leave for the page being left, then
    /// reset all per-page counters for the next one.
    pub fn route_change_start(&mut self, next_path: &str) {
        if let Some(inner) = self.inner.as_mut() {
            inner.lifecycle.record_leave(
                &inner.path,
                inner.scroll.max_depth(),
                inner.clicks.count(),
            );
            inner.scroll.reset();
            inner.clicks.reset();
            inner.lifecycle.reset();
            inner.path = next_path.to_string();
            debug!(path = next_path, "route change");
        }
    }

    /// Register host-side teardown to run exactly once at shutdown.
    pub fn register_disposer(&mut self, disposer: Disposer) {
        self.disposers.push(disposer);
    }

    /// Final leave merge plus teardown. Idempotent: a second call (or the
    /// drop after an explicit call) is a no-op.
    pub fn shutdown(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.lifecycle.record_leave(
                &inner.path,
                inner.scroll.max_depth(),
                inner.clicks.count(),
            );
            info!(session_id = %inner.session_id, "behavior tracker shut down");
        }
        for disposer in &mut self.disposers {
            disposer.dispose();
        }
        self.disposers.clear();
    }
}

impl Drop for BehaviorTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
