//! Click classifier and tracker — matches clicks against the configured
//! selector allowlist, classifies intent, and records counts per page view.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use freemium_core::event_bus::{make_event, EventSink};
use freemium_core::types::BehaviorEventKind;

use crate::clock::Clock;
use crate::selectors::{should_track, ClickTarget};
use crate::store::{BehaviorStore, PageUpdate};

/// Click intent, first matching rule wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    ExternalLink,
    InternalLink,
    Button,
    ArticleContent,
    General,
}

impl ClickKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickKind::ExternalLink => "external_link",
            ClickKind::InternalLink => "internal_link",
            ClickKind::Button => "button",
            ClickKind::ArticleContent => "article_content",
            ClickKind::General => "general",
        }
    }
}

/// Details of the most recent tracked click, persisted in the page record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickDetail {
    pub element_type: String,
    pub element_class: String,
    pub element_id: String,
    pub click_type: ClickKind,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Classify a click target. Anchors split on an absolute `http` href,
/// buttons are buttons, anything inside an `article` is article content.
pub fn classify(target: &ClickTarget) -> ClickKind {
    let node = &target.node;
    if node.tag == "a" {
        let external = node
            .href
            .as_deref()
            .is_some_and(|href| href.starts_with("http"));
        return if external {
            ClickKind::ExternalLink
        } else {
            ClickKind::InternalLink
        };
    }
    if node.tag == "button" {
        return ClickKind::Button;
    }
    if target.closest(|n| n.tag == "article").is_some() {
        return ClickKind::ArticleContent;
    }
    ClickKind::General
}

/// Tracks clicks for the current page view. The counter resets on route
/// change; untracked clicks produce no event and no merge.
pub struct ClickTracker {
    selectors: Vec<String>,
    click_count: u32,
    session_id: String,
    store: Arc<BehaviorStore>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl ClickTracker {
    pub fn new(
        selectors: Vec<String>,
        session_id: String,
        store: Arc<BehaviorStore>,
        sink: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            selectors,
            click_count: 0,
            session_id,
            store,
            sink,
            clock,
        }
    }

    /// Handle a click on `path`. Returns the classification when tracked.
    pub fn on_click(&mut self, path: &str, target: &ClickTarget) -> Option<ClickKind> {
        if !should_track(target, &self.selectors) {
            return None;
        }

        self.click_count += 1;
        let kind = classify(target);
        let now = self.clock.now_ms();

        let detail = ClickDetail {
            element_type: target.node.tag.clone(),
            element_class: target.node.class_attr(),
            element_id: target.node.id.clone().unwrap_or_default(),
            click_type: kind,
            timestamp: now,
            href: target.node.href.clone(),
        };

        let mut event = make_event(
            BehaviorEventKind::Click,
            self.session_id.clone(),
            path,
            Some(kind.as_str().to_string()),
            Some(1),
        );
        event
            .properties
            .insert("element".into(), serde_json::json!(target.node.tag));
        self.sink.emit(event);

        debug!(
            click_type = kind.as_str(),
            element = %target.node.tag,
            count = self.click_count,
            "click tracked"
        );

        self.store.merge_page_data(
            &self.session_id,
            path,
            PageUpdate::Click {
                click_count: self.click_count,
                last_click: detail,
            },
        );
        Some(kind)
    }

    pub fn count(&self) -> u32 {
        self.click_count
    }

    /// Route-change boundary: the per-page counter starts over.
    pub fn reset(&mut self) {
        self.click_count = 0;
    }
}
