//! End-to-end visit simulation against the public tracker facade: mount,
//! scrolls, clicks, idle period, a route change, and shutdown, asserting
//! both the persisted blob and the emitted event stream.

use std::sync::Arc;

use freemium_behavior::{
    ActivitySignal, BehaviorTracker, ClickKind, ClickTarget, DomNode, KvStorage, ManualClock,
    MemoryStorage, PageContext, StorageScopes,
};
use freemium_core::config::BehaviorConfig;
use freemium_core::event_bus::{capture_sink, EventSink};
use freemium_core::types::BehaviorEventKind;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn test_full_visit_flow() {
    let clock = Arc::new(ManualClock::new(NOW));
    let session_storage = Arc::new(MemoryStorage::new());
    let local_storage = Arc::new(MemoryStorage::new());
    let scopes = StorageScopes::new(session_storage.clone(), local_storage.clone());
    let sink = capture_sink();
    let ctx = PageContext {
        user_agent: "Mozilla/5.0".into(),
        referrer: Some("https://search.example".into()),
        viewport_width: 1440,
        viewport_height: 900,
        language: "en-US".into(),
        ..PageContext::default()
    };

    let mut tracker = BehaviorTracker::mount(
        &BehaviorConfig::default(),
        scopes,
        sink.clone() as Arc<dyn EventSink>,
        clock.clone(),
        "/posts/hello",
        &ctx,
    );
    let session_id = tracker.session_id().unwrap().to_string();

    // Read half the article; the 25% milestone fires, 50% waits for the
    // next signal.
    tracker.on_scroll(520.0, 0.0, 1000.0);
    assert_eq!(sink.count_kind(BehaviorEventKind::ScrollDepth), 1);
    tracker.on_scroll(550.0, 0.0, 1000.0);
    assert_eq!(sink.count_kind(BehaviorEventKind::ScrollDepth), 2);

    // Click an outbound link inside the article body.
    let target = ClickTarget::new(
        DomNode::new("a")
            .with_class("external")
            .with_href("https://other.example/ref"),
    )
    .with_ancestors(vec![DomNode::new("article"), DomNode::new("body")]);
    assert_eq!(tracker.on_click(&target), Some(ClickKind::ExternalLink));

    // Heartbeats while reading.
    clock.advance(21_000);
    tracker.tick();

    // Walk away past the inactivity timeout; the check interval for the
    // default 60s timeout is 20s.
    clock.advance(70_000);
    tracker.tick();

    let snapshot = tracker.store_snapshot();
    let page = &snapshot[&session_id].pages["/posts/hello"];
    assert_eq!(page.max_scroll_depth, Some(55));
    assert_eq!(page.click_count, Some(1));
    assert_eq!(page.user_agent.as_deref(), Some("Mozilla/5.0"));
    assert_eq!(page.viewport.as_deref(), Some("1440x900"));
    assert!(page.became_inactive_at.is_some());

    // Coming back and navigating away records the first page's totals.
    tracker.on_activity(ActivitySignal::PointerMove);
    tracker.route_change_start("/posts/next");
    assert_eq!(sink.count_kind(BehaviorEventKind::TimeOnPage), 1);

    let snapshot = tracker.store_snapshot();
    let page = &snapshot[&session_id].pages["/posts/hello"];
    assert!(page.became_active_at.is_some());
    assert_eq!(page.time_on_page, Some(91));
    assert!(page.leave_time.is_some());

    // The new page view starts from zero.
    tracker.on_scroll(100.0, 0.0, 1000.0);
    let snapshot = tracker.store_snapshot();
    assert_eq!(
        snapshot[&session_id].pages["/posts/next"].max_scroll_depth,
        Some(10)
    );

    // Shutdown records the second page's leave; a bounced page (under 5s)
    // emits no time-on-page event.
    clock.advance(1_000);
    tracker.shutdown();
    assert_eq!(sink.count_kind(BehaviorEventKind::TimeOnPage), 1);

    let blob = local_storage
        .get("freemium_analytics_userBehavior")
        .unwrap()
        .unwrap();
    assert!(blob.contains("maxScrollDepth"));
    assert!(blob.contains(&session_id));

    // The session id survives for the next mount in the same tab, keyed
    // under the full store key.
    let reread = session_storage
        .get("freemium_analytics_userBehavior_sessionId")
        .unwrap()
        .unwrap();
    assert_eq!(reread, session_id);
}
