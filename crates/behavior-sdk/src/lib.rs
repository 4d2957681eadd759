//! Visitor behavior telemetry — session identity, a pruned per-session
//! metric store, and the per-page trackers (scroll depth, clicks,
//! activity/idle, page lifecycle) coordinated behind one tracker facade.
//!
//! # Modules
//!
//! - [`storage`] — key/value storage seam with session and local scopes
//! - [`clock`] — injectable time source driving every interval and timeout
//! - [`capabilities`] — one-shot feature probe run at mount
//! - [`session`] — stable per-tab session identity with storage fallback
//! - [`store`] — the persisted behavior blob: merge, prune, self-heal
//! - [`selectors`] — click-target allowlist matching
//! - [`scroll`] — monotonic scroll depth and milestone firing
//! - [`clicks`] — click classification and counting
//! - [`activity`] — Active⇄Inactive edge-triggered state machine
//! - [`lifecycle`] — page entry, heartbeat, and leave recording
//! - [`tracker`] — the coordinator wiring it all to the host shell
//! - [`adaptors`] — third-party payload transforms (gtag, umami)

pub mod activity;
pub mod adaptors;
pub mod capabilities;
pub mod clicks;
pub mod clock;
pub mod lifecycle;
pub mod scroll;
pub mod selectors;
pub mod session;
pub mod storage;
pub mod store;
pub mod tracker;

pub use activity::{ActivitySignal, ActivityState};
pub use adaptors::gtag::GtagAdaptor;
pub use adaptors::umami::UmamiAdaptor;
pub use adaptors::EventAdaptor;
pub use capabilities::Capabilities;
pub use clicks::{ClickKind, ClickTracker};
pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use lifecycle::PageContext;
pub use scroll::ScrollTracker;
pub use selectors::{ClickTarget, DomNode};
pub use storage::{KvStorage, MemoryStorage, StorageError, StorageScopes};
pub use store::{BehaviorStore, PageRecord, PageUpdate, SessionRecord, StoreMap};
pub use tracker::{BehaviorTracker, Disposer};
