//! Google Analytics gtag adaptor — renders behavior events as the
//! `gtag('event', name, params)` calls the site shell forwards to GA4.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EventAdaptor;
use freemium_core::error::{TelemetryError, TelemetryResult};
use freemium_core::types::{BehaviorEvent, BehaviorEventKind};

/// Configuration for the gtag adaptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GtagConfig {
    /// GA4 Measurement ID, e.g. "G-XXXXXXXXXX".
    pub measurement_id: String,
    /// Enable debug mode for GA4 validation (default: false).
    pub debug_mode: bool,
}

impl Default for GtagConfig {
    fn default() -> Self {
        Self {
            measurement_id: String::new(),
            debug_mode: false,
        }
    }
}

pub struct GtagAdaptor {
    config: GtagConfig,
}

impl GtagAdaptor {
    pub fn new(config: GtagConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GtagConfig {
        &self.config
    }

    fn event_name(kind: BehaviorEventKind) -> &'static str {
        match kind {
            BehaviorEventKind::ScrollDepth => "scroll_depth",
            BehaviorEventKind::Click => "click",
            BehaviorEventKind::TimeOnPage => "time_on_page",
        }
    }
}

impl EventAdaptor for GtagAdaptor {
    fn platform(&self) -> &str {
        "gtag"
    }

    fn transform(&self, event: &BehaviorEvent) -> TelemetryResult<serde_json::Value> {
        let name = Self::event_name(event.kind);

        let mut params = serde_json::json!({
            "event_category": event.category,
            "page_path": event.page_path,
        });
        if let Some(ref label) = event.label {
            params["event_label"] = serde_json::json!(label);
        }
        if let Some(value) = event.value {
            params["value"] = serde_json::json!(value);
        }
        if let Some(obj) = params.as_object_mut() {
            for (key, value) in &event.properties {
                obj.insert(key.clone(), value.clone());
            }
            if self.config.debug_mode {
                obj.insert("debug_mode".into(), serde_json::json!(true));
            }
        }

        debug!(name, measurement_id = %self.config.measurement_id, "gtag event transformed");

        Ok(serde_json::json!({
            "event": name,
            "params": params,
        }))
    }

    fn validate_config(&self) -> TelemetryResult<()> {
        if self.config.measurement_id.is_empty() {
            return Err(TelemetryError::Adaptor(
                "gtag measurement_id must not be empty".into(),
            ));
        }
        if !self.config.measurement_id.starts_with("G-") {
            return Err(TelemetryError::Adaptor(format!(
                "gtag measurement_id must start with 'G-', got '{}'",
                self.config.measurement_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freemium_core::event_bus::make_event;

    fn test_config() -> GtagConfig {
        GtagConfig {
            measurement_id: "G-TEST12345".into(),
            debug_mode: false,
        }
    }

    #[test]
    fn test_scroll_depth_transform() {
        let adaptor = GtagAdaptor::new(test_config());
        let event = make_event(
            BehaviorEventKind::ScrollDepth,
            "s-1",
            "/posts/a",
            Some("75%".into()),
            Some(75),
        );

        let payload = adaptor.transform(&event).unwrap();
        assert_eq!(payload["event"], "scroll_depth");
        assert_eq!(payload["params"]["event_category"], "User Behavior");
        assert_eq!(payload["params"]["event_label"], "75%");
        assert_eq!(payload["params"]["value"], 75);
        assert_eq!(payload["params"]["page_path"], "/posts/a");
    }

    #[test]
    fn test_click_properties_merged() {
        let adaptor = GtagAdaptor::new(test_config());
        let mut event = make_event(
            BehaviorEventKind::Click,
            "s-1",
            "/",
            Some("external_link".into()),
            Some(1),
        );
        event
            .properties
            .insert("element".into(), serde_json::json!("a"));

        let payload = adaptor.transform(&event).unwrap();
        assert_eq!(payload["event"], "click");
        assert_eq!(payload["params"]["element"], "a");
    }

    #[test]
    fn test_debug_mode_flag() {
        let adaptor = GtagAdaptor::new(GtagConfig {
            debug_mode: true,
            ..test_config()
        });
        let event = make_event(BehaviorEventKind::TimeOnPage, "s-1", "/", None, Some(12));
        let payload = adaptor.transform(&event).unwrap();
        assert_eq!(payload["params"]["debug_mode"], true);
    }

    #[test]
    fn test_validate_config() {
        assert!(GtagAdaptor::new(test_config()).validate_config().is_ok());

        let empty = GtagAdaptor::new(GtagConfig::default());
        assert!(empty.validate_config().is_err());

        let legacy = GtagAdaptor::new(GtagConfig {
            measurement_id: "UA-12345".into(),
            debug_mode: false,
        });
        assert!(legacy.validate_config().is_err());
    }

    #[test]
    fn test_validate_error_names_the_field() {
        let err = GtagAdaptor::new(GtagConfig::default())
            .validate_config()
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Adaptor(_)));
        assert!(err.to_string().contains("measurement_id"));
    }
}
