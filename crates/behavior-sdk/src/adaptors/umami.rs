//! Umami adaptor — renders behavior events as `umami.track(name, data)`
//! payloads with human-readable event names and flat data objects.

use super::EventAdaptor;
use freemium_core::error::TelemetryResult;
use freemium_core::types::{BehaviorEvent, BehaviorEventKind};

#[derive(Debug, Clone, Default)]
pub struct UmamiAdaptor;

impl UmamiAdaptor {
    pub fn new() -> Self {
        Self
    }

    fn event_name(kind: BehaviorEventKind) -> &'static str {
        match kind {
            BehaviorEventKind::ScrollDepth => "Scroll Depth",
            BehaviorEventKind::Click => "Click",
            BehaviorEventKind::TimeOnPage => "Time on Page",
        }
    }
}

impl EventAdaptor for UmamiAdaptor {
    fn platform(&self) -> &str {
        "umami"
    }

    fn transform(&self, event: &BehaviorEvent) -> TelemetryResult<serde_json::Value> {
        let mut data = match event.kind {
            BehaviorEventKind::ScrollDepth => serde_json::json!({
                "depth": event.value,
            }),
            BehaviorEventKind::Click => serde_json::json!({
                "type": event.label,
            }),
            BehaviorEventKind::TimeOnPage => serde_json::json!({
                "seconds": event.value,
                "path": event.page_path,
            }),
        };
        if let Some(obj) = data.as_object_mut() {
            for (key, value) in &event.properties {
                obj.insert(key.clone(), value.clone());
            }
        }

        Ok(serde_json::json!({
            "name": Self::event_name(event.kind),
            "data": data,
        }))
    }

    fn validate_config(&self) -> TelemetryResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freemium_core::event_bus::make_event;

    #[test]
    fn test_scroll_depth_transform() {
        let adaptor = UmamiAdaptor::new();
        let event = make_event(
            BehaviorEventKind::ScrollDepth,
            "s-1",
            "/",
            Some("50%".into()),
            Some(50),
        );
        let payload = adaptor.transform(&event).unwrap();
        assert_eq!(payload["name"], "Scroll Depth");
        assert_eq!(payload["data"]["depth"], 50);
    }

    #[test]
    fn test_click_transform_includes_element() {
        let adaptor = UmamiAdaptor::new();
        let mut event = make_event(
            BehaviorEventKind::Click,
            "s-1",
            "/",
            Some("button".into()),
            Some(1),
        );
        event
            .properties
            .insert("element".into(), serde_json::json!("button"));

        let payload = adaptor.transform(&event).unwrap();
        assert_eq!(payload["name"], "Click");
        assert_eq!(payload["data"]["type"], "button");
        assert_eq!(payload["data"]["element"], "button");
    }

    #[test]
    fn test_batch_transform() {
        let adaptor = UmamiAdaptor::new();
        let events = vec![
            make_event(BehaviorEventKind::ScrollDepth, "s-1", "/", None, Some(25)),
            make_event(BehaviorEventKind::TimeOnPage, "s-1", "/", None, Some(30)),
        ];
        let payloads = adaptor.transform_batch(&events).unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[1]["name"], "Time on Page");
        assert_eq!(payloads[1]["data"]["seconds"], 30);
    }
}
