//! Shared session handle.
//!
//! Holds the entity store, the feed state, and the dashboard CSRF token. The
//! handle is cloned into every workflow; clones share the same state.

use crate::feed::{self, EventView, ImportFeed, ImportState, Signal};
use crate::models::CategoryId;
use crate::store::{Entities, EntityKeys, EntityStore};
use log::debug;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

const SIGNAL_BUFFER: usize = 256;

struct Inner {
    store: RwLock<EntityStore>,
    state: RwLock<ImportState>,
    csrf_token: RwLock<Option<String>>,
    signals: broadcast::Sender<Signal>,
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl Session {
    pub fn new(csrf_token: Option<String>) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_BUFFER);
        Self {
            inner: Arc::new(Inner {
                store: RwLock::new(EntityStore::new()),
                state: RwLock::new(ImportState::default()),
                csrf_token: RwLock::new(csrf_token),
                signals,
            }),
        }
    }

    /// Read access to the store. Do not hold the guard across an `.await`.
    pub fn store(&self) -> RwLockReadGuard<'_, EntityStore> {
        read(&self.inner.store)
    }

    /// Read access to the feed state. Do not hold the guard across an `.await`.
    pub fn state(&self) -> RwLockReadGuard<'_, ImportState> {
        read(&self.inner.state)
    }

    pub fn merge(&self, batch: Entities) {
        if batch.is_empty() {
            return;
        }
        write(&self.inner.store).merge(batch);
    }

    pub fn remove(&self, keys: &EntityKeys) {
        if keys.is_empty() {
            return;
        }
        write(&self.inner.store).remove(keys);
    }

    /// Folds the signal into the feed state, then broadcasts it.
    pub fn dispatch(&self, signal: Signal) {
        debug!("Signal: {:?}", signal);
        write(&self.inner.state).apply(&signal);
        // No subscribers is fine.
        let _ = self.inner.signals.send(signal);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.inner.signals.subscribe()
    }

    pub fn csrf_token(&self) -> Option<String> {
        read(&self.inner.csrf_token).clone()
    }

    pub fn set_csrf_token(&self, token: Option<String>) {
        *write(&self.inner.csrf_token) = token;
    }

    pub fn feed(&self, source: &str) -> ImportFeed {
        self.state().feed(source).cloned().unwrap_or_default()
    }

    pub fn known_categories(&self) -> Vec<CategoryId> {
        self.state().categories.ids.clone()
    }

    pub fn visible_events(&self, source: &str) -> Vec<EventView> {
        let state = self.state();
        let store = self.store();
        feed::visible_events(&state, &store, source)
    }

    pub fn already_imported_count(&self, source: &str) -> usize {
        let state = self.state();
        let store = self.store();
        feed::already_imported_count(&state, &store, source)
    }
}

// A panicking reader or writer leaves plain data behind, so poisoning is ignored.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Action, Payload};

    #[tokio::test]
    async fn test_dispatch_reduces_and_broadcasts() {
        let session = Session::default();
        let mut rx = session.subscribe();

        session.dispatch(Signal::Completed(
            Action::LoadCategories,
            Payload::Categories(vec![1, 2]),
        ));

        assert_eq!(session.known_categories(), vec![1, 2]);
        let received = rx.recv().await.unwrap();
        assert!(matches!(
            received,
            Signal::Completed(Action::LoadCategories, _)
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let session = Session::new(Some("token".to_string()));
        let other = session.clone();
        other.set_csrf_token(Some("rotated".to_string()));
        assert_eq!(session.csrf_token().as_deref(), Some("rotated"));
    }
}
