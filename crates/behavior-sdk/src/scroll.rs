//! Scroll depth tracker — monotonic per-page-view depth with at-most-once
//! milestone firing. Milestone marks live in the session storage scope so a
//! milestone fires once per `(path, milestone)` even across route changes.
//! When the mount-time capability probe found no usable session storage the
//! marks are skipped entirely and milestones fire once per page view instead.

use std::sync::Arc;

use tracing::debug;

use freemium_core::event_bus::{make_event, EventSink};
use freemium_core::types::BehaviorEventKind;

use crate::clock::Clock;
use crate::storage::KvStorage;
use crate::store::{BehaviorStore, PageUpdate};

/// Scroll percentage from raw geometry. A degenerate document height yields
/// an over-100 value; callers clamp via `min(_, 100)`.
pub fn compute_percent(scroll_top: f64, viewport_height: f64, document_height: f64) -> u32 {
    if document_height <= 0.0 {
        return u32::MAX;
    }
    let percent = ((scroll_top + viewport_height) / document_height * 100.0).round();
    if percent <= 0.0 {
        0
    } else {
        percent as u32
    }
}

pub struct ScrollTracker {
    milestones: Vec<u32>,
    max_depth: u32,
    storage_key: String,
    session_id: String,
    marks: Arc<dyn KvStorage>,
    marks_available: bool,
    store: Arc<BehaviorStore>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl ScrollTracker {
    /// `milestones` must already be normalized (ascending, deduped); see
    /// `MilestonesSetting::normalize`. `marks_available` is the capability
    /// probe's verdict on the marks scope; when false, mark reads and writes
    /// are skipped.
    pub fn new(
        milestones: Vec<u32>,
        storage_key: String,
        session_id: String,
        marks: Arc<dyn KvStorage>,
        marks_available: bool,
        store: Arc<BehaviorStore>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            milestones,
            max_depth: 0,
            storage_key,
            session_id,
            marks,
            marks_available,
            store,
            sink,
            clock,
        }
    }

    /// Handle a scroll signal for `path`. Returns the milestone fired on this
    /// signal, if any. At most one milestone fires per signal: the lowest
    /// unmarked milestone that the new depth has reached; milestones skipped
    /// in one jump fire on subsequent signals.
    pub fn on_scroll(
        &mut self,
        path: &str,
        scroll_top: f64,
        viewport_height: f64,
        document_height: f64,
    ) -> Option<u32> {
        let percent = compute_percent(scroll_top, viewport_height, document_height);
        if percent <= self.max_depth {
            return None;
        }
        self.max_depth = percent.min(100);

        let fired = self.first_unmarked_milestone(path);
        if let Some(milestone) = fired {
            if self.marks_available {
                let mark_key = self.mark_key(milestone, path);
                // Best effort; a denied write just means the milestone may
                // fire again after a reload.
                if let Err(e) = self.marks.set(&mark_key, "true") {
                    debug!(error = %e, milestone, "milestone mark not persisted");
                }
            }

            self.sink.emit(make_event(
                BehaviorEventKind::ScrollDepth,
                self.session_id.clone(),
                path,
                Some(format!("{milestone}%")),
                Some(i64::from(milestone)),
            ));
            debug!(milestone, depth = self.max_depth, "scroll milestone reached");
        }

        self.store.merge_page_data(
            &self.session_id,
            path,
            PageUpdate::Scroll {
                max_scroll_depth: self.max_depth,
                last_scroll_time: self.clock.now_ms(),
            },
        );
        fired
    }

    fn first_unmarked_milestone(&self, path: &str) -> Option<u32> {
        self.milestones
            .iter()
            .copied()
            .find(|&milestone| {
                if self.max_depth < milestone {
                    return false;
                }
                if !self.marks_available {
                    return true;
                }
                match self.marks.get(&self.mark_key(milestone, path)) {
                    Ok(Some(_)) => false,
                    Ok(None) => true,
                    // Unreadable marks do not suppress the milestone.
                    Err(_) => true,
                }
            })
    }

    fn mark_key(&self, milestone: u32, path: &str) -> String {
        format!("{}_scroll_{}_{}", self.storage_key, milestone, path)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Route-change boundary: depth starts over for the next page view.
    pub fn reset(&mut self) {
        self.max_depth = 0;
    }
}
