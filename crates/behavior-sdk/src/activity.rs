//! Activity/idle monitor — a two-state machine per page view. Transitions
//! are edge-triggered: steady state produces no writes.

use std::sync::Arc;

use tracing::debug;

use crate::clock::Clock;
use crate::store::{BehaviorStore, PageUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Active,
    Inactive,
}

/// Interaction signals that reset the idle timer; mirrors the browser
/// listener set (mousedown, mousemove, keypress, scroll, touchstart).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
}

/// Interval for the periodic inactivity check.
pub fn check_interval_ms(inactivity_timeout_ms: u64) -> u64 {
    (inactivity_timeout_ms / 3).clamp(5_000, 60_000)
}

pub struct ActivityMonitor {
    timeout_ms: i64,
    last_activity: i64,
    state: ActivityState,
    session_id: String,
    store: Arc<BehaviorStore>,
    clock: Arc<dyn Clock>,
}

impl ActivityMonitor {
    pub fn new(
        inactivity_timeout_ms: u64,
        session_id: String,
        store: Arc<BehaviorStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let last_activity = clock.now_ms();
        Self {
            timeout_ms: inactivity_timeout_ms as i64,
            last_activity,
            state: ActivityState::Active,
            session_id,
            store,
            clock,
        }
    }

    /// Any interaction resets the idle timer; an Inactive monitor flips back
    /// to Active and records the transition.
    pub fn on_signal(&mut self, path: &str, _signal: ActivitySignal) {
        let now = self.clock.now_ms();
        self.last_activity = now;
        if self.state == ActivityState::Inactive {
            self.state = ActivityState::Active;
            debug!("visitor became active");
            self.store
                .merge_page_data(&self.session_id, path, PageUpdate::BecameActive { at: now });
        }
    }

    /// Periodic check. Returns true when this call flipped Active→Inactive.
    pub fn check(&mut self, path: &str) -> bool {
        let now = self.clock.now_ms();
        if self.state == ActivityState::Active && now - self.last_activity > self.timeout_ms {
            self.state = ActivityState::Inactive;
            debug!(idle_ms = now - self.last_activity, "visitor became inactive");
            self.store.merge_page_data(
                &self.session_id,
                path,
                PageUpdate::BecameInactive { at: now },
            );
            return true;
        }
        false
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    const NOW: i64 = 1_700_000_000_000;

    fn monitor(timeout_ms: u64) -> (ActivityMonitor, Arc<ManualClock>, Arc<BehaviorStore>) {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(BehaviorStore::new(
            Arc::new(MemoryStorage::new()),
            clock.clone(),
            "freemium_analytics_userBehavior".into(),
            30,
        ));
        let monitor =
            ActivityMonitor::new(timeout_ms, "s-1".into(), store.clone(), clock.clone());
        (monitor, clock, store)
    }

    #[test]
    fn test_check_interval_clamping() {
        assert_eq!(check_interval_ms(60_000), 20_000);
        assert_eq!(check_interval_ms(3_000), 5_000);
        assert_eq!(check_interval_ms(600_000), 60_000);
    }

    #[test]
    fn test_idle_transition_fires_once() {
        let (mut monitor, clock, store) = monitor(1_000);
        assert_eq!(monitor.state(), ActivityState::Active);

        clock.advance(1_200);
        assert!(monitor.check("/"));
        assert_eq!(monitor.state(), ActivityState::Inactive);
        assert_eq!(
            store.load()["s-1"].pages["/"].became_inactive_at,
            Some(NOW + 1_200)
        );

        // Steady state: no repeated transition, no repeated write.
        clock.advance(1_200);
        assert!(!monitor.check("/"));
        assert_eq!(
            store.load()["s-1"].pages["/"].became_inactive_at,
            Some(NOW + 1_200)
        );
    }

    #[test]
    fn test_signal_within_timeout_keeps_active() {
        let (mut monitor, clock, store) = monitor(1_000);

        clock.advance(800);
        monitor.on_signal("/", ActivitySignal::PointerMove);
        clock.advance(800);
        assert!(!monitor.check("/"));
        assert_eq!(monitor.state(), ActivityState::Active);
        // Still-active signals are not merged.
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_reactivation_is_edge_triggered() {
        let (mut monitor, clock, store) = monitor(1_000);

        clock.advance(2_000);
        monitor.check("/");
        clock.advance(500);
        monitor.on_signal("/", ActivitySignal::KeyPress);
        assert_eq!(monitor.state(), ActivityState::Active);
        let became_active = store.load()["s-1"].pages["/"].became_active_at;
        assert_eq!(became_active, Some(NOW + 2_500));

        // A second signal while already active writes nothing new.
        clock.advance(100);
        monitor.on_signal("/", ActivitySignal::Scroll);
        assert_eq!(
            store.load()["s-1"].pages["/"].became_active_at,
            became_active
        );
    }
}
