//! Per-session busy flag for backend-mutating requests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

/// Sessions with a mutating request in flight.
#[derive(Clone, Debug, Default)]
pub struct BusyRegistry {
    inner: Arc<Mutex<HashSet<Uuid>>>,
}

impl BusyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the session busy; `None` while another request holds the flag.
    pub fn try_acquire(&self, session_id: Uuid) -> Option<BusyGuard> {
        let mut busy = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !busy.insert(session_id) {
            log::warn!("Rejecting concurrent operation for session {session_id}");
            return None;
        }
        Some(BusyGuard {
            registry: self.clone(),
            session_id,
        })
    }

    pub fn is_busy(&self, session_id: &Uuid) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(session_id)
    }
}

/// Clears the busy flag when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    registry: BusyRegistry,
    session_id: Uuid,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.registry
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_waits_for_the_guard() {
        let registry = BusyRegistry::new();
        let session = Uuid::new_v4();

        let guard = registry.try_acquire(session).unwrap();
        assert!(registry.try_acquire(session).is_none());
        assert!(registry.try_acquire(Uuid::new_v4()).is_some());

        drop(guard);
        assert!(!registry.is_busy(&session));
        assert!(registry.try_acquire(session).is_some());
    }

    #[test]
    fn flag_is_released_on_panic() {
        let registry = BusyRegistry::new();
        let session = Uuid::new_v4();

        let cloned = registry.clone();
        let outcome = std::panic::catch_unwind(move || {
            let _guard = cloned.try_acquire(session);
            panic!("backend call blew up");
        });

        assert!(outcome.is_err());
        assert!(!registry.is_busy(&session));
    }
}
