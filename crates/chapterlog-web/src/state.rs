use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chapterlog_core::{Catalog, CatalogClient, DocumentStore, Storage, Tracker};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ServerConfig;

/// Unique identifier for a session, carried in the session cookie
pub type SessionId = Uuid;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One browser's connection to its reading list
pub struct Session {
    pub id: SessionId,
    pub tracker: Arc<Tracker>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, tracker: Arc<Tracker>) -> Self {
        let now = Utc::now();
        Self {
            id,
            tracker,
            created_at: now,
            last_seen: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }
}

/// Live sessions keyed by cookie value
///
/// Sessions that resolve to the same owner share the owner's list: a write
/// in one shows up in the others through the store's subscription.
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<SessionId, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker of a live session, marking the session as seen
    pub fn tracker(&mut self, session_id: SessionId) -> Option<Arc<Tracker>> {
        let session = self.sessions.get_mut(&session_id)?;
        session.touch();
        Some(Arc::clone(&session.tracker))
    }

    /// Register a session unless another request got there first
    pub fn insert(&mut self, session_id: SessionId, tracker: Arc<Tracker>) -> Arc<Tracker> {
        let session = self
            .sessions
            .entry(session_id)
            .or_insert_with(|| Session::new(session_id, tracker));
        Arc::clone(&session.tracker)
    }

    pub fn get_session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    /// Drop a session; its subscription is released with the last handle
    pub fn end_session(&mut self, session_id: SessionId) -> bool {
        self.sessions.remove(&session_id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// End every session not seen within `max_idle` of `now`.
    ///
    /// The owner's list is persisted, so a returning cookie simply starts a
    /// fresh tracker over the same documents.
    pub fn evict_idle(&mut self, now: DateTime<Utc>, max_idle: chrono::Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.signed_duration_since(session.last_seen) <= max_idle);
        before - self.sessions.len()
    }
}

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<SessionManager>>,
    pub store: Arc<dyn DocumentStore>,
    pub catalog: Arc<dyn Catalog>,
    pub config: ServerConfig,
}

impl AppState {
    /// Open the database and catalog client named by `config`
    pub async fn open(config: ServerConfig) -> anyhow::Result<Self> {
        if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Storage::open(&config.db_path).await?;
        let catalog = CatalogClient::new(config.catalog.clone())?;
        Ok(Self::with_parts(config, Arc::new(store), Arc::new(catalog)))
    }

    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(SessionManager::new())),
            store,
            catalog,
            config,
        }
    }

    /// Periodically end idle sessions for as long as the server runs.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let sessions = Arc::clone(&self.sessions);
        let max_idle = self.config.session_idle();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let evicted = sessions.write().await.evict_idle(Utc::now(), max_idle);
                if evicted > 0 {
                    tracing::debug!(evicted, "Ended idle sessions");
                }
            }
        })
    }

    /// The tracker behind `session_id`, starting one on first use.
    ///
    /// Anonymous sessions own their list: the owner id is the session id.
    pub async fn tracker(&self, session_id: SessionId) -> chapterlog_core::Result<Arc<Tracker>> {
        if let Some(tracker) = self.sessions.write().await.tracker(session_id) {
            return Ok(tracker);
        }

        let tracker = Tracker::start(
            session_id.to_string(),
            Arc::clone(&self.store),
            Arc::clone(&self.catalog),
            self.config.catalog.search_limit,
        )
        .await?;
        tracing::debug!(%session_id, "Started session");

        Ok(self.sessions.write().await.insert(session_id, Arc::new(tracker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterlog_core::{CatalogConfig, ReadingStatus};
    use serde_json::json;

    async fn make_state() -> AppState {
        let store = Storage::open_memory().await.unwrap();
        let catalog = CatalogClient::new(CatalogConfig::default()).unwrap();
        AppState::with_parts(ServerConfig::default(), Arc::new(store), Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let state = make_state().await;
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        state.tracker(stale).await.unwrap();
        state.tracker(fresh).await.unwrap();

        let now = Utc::now();
        {
            let mut manager = state.sessions.write().await;
            if let Some(session) = manager.sessions.get_mut(&stale) {
                session.last_seen = now - chrono::Duration::hours(2);
            }
            assert_eq!(manager.evict_idle(now, chrono::Duration::hours(1)), 1);
            assert!(manager.get_session(stale).is_none());
            assert!(manager.get_session(fresh).is_some());
            assert_eq!(manager.evict_idle(now, chrono::Duration::hours(1)), 0);
        }
    }

    #[tokio::test]
    async fn test_evicted_session_resumes_its_list() {
        let state = make_state().await;
        let id = Uuid::new_v4();
        state.tracker(id).await.unwrap();

        let payload = match json!({ "title": "Vinland Saga", "status": "reading" }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        state.store.create(&id.to_string(), payload).await.unwrap();

        let later = Utc::now() + chrono::Duration::days(1);
        assert_eq!(
            state.sessions.write().await.evict_idle(later, chrono::Duration::hours(1)),
            1
        );
        assert_eq!(state.sessions.read().await.session_count(), 0);

        let tracker = state.tracker(id).await.unwrap();
        let items = tracker.items().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, ReadingStatus::Reading);
        assert_eq!(state.sessions.read().await.session_count(), 1);
    }
}
