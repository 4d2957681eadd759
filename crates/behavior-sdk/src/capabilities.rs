//! One-shot capability probe, run at tracker initialization. Trackers consult
//! the resulting struct instead of re-detecting features at every call site.

use crate::lifecycle::PageContext;
use crate::storage::{KvStorage, StorageScopes};

const PROBE_KEY: &str = "__freemium_probe__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_session_storage: bool,
    pub has_local_storage: bool,
    pub has_performance_api: bool,
    pub has_connection_api: bool,
}

impl Capabilities {
    /// Probe both storage scopes with a write/remove cycle and take the
    /// browser API flags from the page context.
    pub fn probe(scopes: &StorageScopes, ctx: &PageContext) -> Self {
        Self {
            has_session_storage: probe_storage(scopes.session.as_ref()),
            has_local_storage: probe_storage(scopes.local.as_ref()),
            has_performance_api: ctx.has_performance_api,
            has_connection_api: ctx.has_connection_api,
        }
    }
}

fn probe_storage(storage: &dyn KvStorage) -> bool {
    storage
        .set(PROBE_KEY, "1")
        .and_then(|_| storage.remove(PROBE_KEY))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingStorage, MemoryStorage};
    use std::sync::Arc;

    #[test]
    fn test_probe_in_memory() {
        let scopes = StorageScopes::in_memory();
        let caps = Capabilities::probe(&scopes, &PageContext::default());
        assert!(caps.has_session_storage);
        assert!(caps.has_local_storage);
        assert!(!caps.has_performance_api);
    }

    #[test]
    fn test_probe_leaves_no_residue() {
        let session = Arc::new(MemoryStorage::new());
        let scopes = StorageScopes::new(session.clone(), Arc::new(MemoryStorage::new()));
        Capabilities::probe(&scopes, &PageContext::default());
        assert!(session.is_empty());
    }

    #[test]
    fn test_probe_failing_storage() {
        let scopes = StorageScopes::new(Arc::new(FailingStorage), Arc::new(MemoryStorage::new()));
        let ctx = PageContext {
            has_performance_api: true,
            ..PageContext::default()
        };
        let caps = Capabilities::probe(&scopes, &ctx);
        assert!(!caps.has_session_storage);
        assert!(caps.has_local_storage);
        assert!(caps.has_performance_api);
    }
}
