//! Adaptors for translating behavior events into third-party analytics
//! payloads. Transport stays external and fire-and-forget; each adaptor
//! implements [`EventAdaptor`] to produce the JSON its platform expects.

pub mod gtag;
pub mod umami;

use freemium_core::error::TelemetryResult;
use freemium_core::types::BehaviorEvent;

/// Adaptor trait — transforms behavior events into a platform payload.
pub trait EventAdaptor: Send + Sync {
    /// Platform identifier (e.g. "gtag", "umami").
    fn platform(&self) -> &str;

    /// Transform one event into the target platform's payload format.
    fn transform(&self, event: &BehaviorEvent) -> TelemetryResult<serde_json::Value>;

    /// Transform a batch of events. Default implementation transforms one-by-one.
    fn transform_batch(&self, events: &[BehaviorEvent]) -> TelemetryResult<Vec<serde_json::Value>> {
        events.iter().map(|e| self.transform(e)).collect()
    }

    /// Validate that the adaptor configuration is correct.
    fn validate_config(&self) -> TelemetryResult<()>;
}
