#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::discover::session::DiscoverSession;
use crate::shopping::ShoppingError;

#[derive(Debug, Error)]
#[error("A fetch is already in flight for this session")]
pub struct SessionBusy;

/// Shared handle to one session. At most one `fetch_next` runs per session:
/// a caller that finds it busy is rejected, not queued.
#[derive(Clone)]
pub struct DiscoverHandle {
    inner: Arc<Mutex<DiscoverSession>>,
}

impl DiscoverHandle {
    pub fn new(session: DiscoverSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Waits for exclusive access, e.g. to read the accumulated goods.
    pub async fn lock(&self) -> MutexGuard<'_, DiscoverSession> {
        self.inner.lock().await
    }

    /// Exclusive access for a fetch, or `SessionBusy` if one is running.
    pub fn try_lock(&self) -> Result<OwnedMutexGuard<DiscoverSession>, SessionBusy> {
        self.inner.clone().try_lock_owned().map_err(|_| SessionBusy)
    }

    /// Drains one term on a background task and reports
    /// `(success, error, item_count)` to `completion`.
    ///
    /// Aborting the returned task loses the popped term.
    pub fn request<F>(&self, completion: F) -> Result<JoinHandle<()>, SessionBusy>
    where
        F: FnOnce(bool, Option<ShoppingError>, Option<usize>) + Send + 'static,
    {
        let mut session = self.try_lock()?;
        Ok(tokio::spawn(async move {
            let outcome = session.fetch_next().await;
            drop(session);
            let (success, error, item_count) = outcome.into_parts();
            completion(success, error, item_count);
        }))
    }
}

/// Sessions idle this long are dropped when a new one is registered.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    handle: DiscoverHandle,
    last_used: Instant,
}

/// Live sessions by id. Every lookup refreshes a session's last use.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Registers `handle` under a fresh id, evicting idle sessions first.
    pub async fn insert(&self, handle: DiscoverHandle) -> Uuid {
        let now = Instant::now();
        let id = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle discover sessions");
        }

        sessions.insert(
            id,
            Entry {
                handle,
                last_used: now,
            },
        );
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<DiscoverHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_used = Instant::now();
        Some(entry.handle.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::session::{DiscoverOptions, SessionState};
    use crate::models::pet::{PetCategory, PetContext, PetKeywordProfile};
    use crate::store::{MemoryStore, Store};
    use crate::test_support::{page, shopping_item, StubShopping};
    use tokio::sync::{oneshot, Notify};

    async fn ready_handle(shopping: Arc<StubShopping>) -> DiscoverHandle {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_profile(&PetKeywordProfile::new(
                PetCategory::Cat,
                vec!["litter".to_string(), "scratcher".to_string()],
            ))
            .await
            .unwrap();
        let mut session = DiscoverSession::new(
            PetContext::new(PetCategory::Cat),
            store,
            shopping,
            DiscoverOptions::default(),
        );
        session.load_context().await;
        session.mixed_word();
        DiscoverHandle::new(session)
    }

    #[tokio::test]
    async fn test_request_reports_through_completion() {
        let shopping = Arc::new(StubShopping::new(vec![Ok(page(vec![
            shopping_item("1"),
            shopping_item("2"),
        ]))]));
        let handle = ready_handle(shopping).await;

        let (tx, rx) = oneshot::channel();
        handle
            .request(move |success, error, count| {
                let _ = tx.send((success, error.is_none(), count));
            })
            .unwrap();

        assert_eq!(rx.await.unwrap(), (true, true, Some(2)));
        assert_eq!(handle.lock().await.goods().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_request_is_rejected() {
        let gate = Arc::new(Notify::new());
        let shopping = Arc::new(StubShopping::gated(
            vec![Ok(page(vec![shopping_item("1")]))],
            gate.clone(),
        ));
        let handle = ready_handle(shopping.clone()).await;

        let first = handle.request(|_, _, _| {}).unwrap();
        assert!(matches!(handle.request(|_, _, _| {}), Err(SessionBusy)));

        gate.notify_one();
        first.await.unwrap();

        assert_eq!(shopping.calls(), 1);
        assert!(handle.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_request_loses_term() {
        let gate = Arc::new(Notify::new());
        let shopping = Arc::new(StubShopping::gated(Vec::new(), gate));
        let handle = ready_handle(shopping.clone()).await;
        assert_eq!(handle.lock().await.pending_terms().len(), 2);

        let task = handle.request(|_, _, _| {}).unwrap();
        while shopping.calls() == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        let session = handle.lock().await;
        assert_eq!(session.pending_terms(), vec!["고양이 scratcher"]);
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.goods().is_empty());
    }

    #[tokio::test]
    async fn test_registry_round_trip() {
        let registry = SessionRegistry::default();
        let handle = ready_handle(Arc::new(StubShopping::default())).await;

        let id = registry.insert(handle).await;
        assert!(registry.get(id).await.is_some());
        assert!(registry.remove(id).await);
        assert!(registry.get(id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_evicts_idle_sessions_on_insert() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let stale = registry
            .insert(ready_handle(Arc::new(StubShopping::default())).await)
            .await;
        let active = registry
            .insert(ready_handle(Arc::new(StubShopping::default())).await)
            .await;

        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(registry.get(active).await.is_some());
        tokio::time::advance(Duration::from_secs(30)).await;

        let fresh = registry
            .insert(ready_handle(Arc::new(StubShopping::default())).await)
            .await;
        assert!(registry.get(stale).await.is_none());
        assert!(registry.get(active).await.is_some());
        assert!(registry.get(fresh).await.is_some());
        assert_eq!(registry.count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_evicts_only_on_insert() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let id = registry
            .insert(ready_handle(Arc::new(StubShopping::default())).await)
            .await;

        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(registry.get(id).await.is_some());
    }
}
