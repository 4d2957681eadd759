pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;

pub use config::BehaviorConfig;
pub use error::{TelemetryError, TelemetryResult};
pub use event_bus::EventSink;
pub use types::{BehaviorEvent, BehaviorEventKind};
