//! Authoritative team roster and match data, with optional write-through persistence.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{info, warn};

use crate::{
    dao::{state_store::StateBackend, storage::StorageError},
    state::match_data::{MatchData, TeamRoster},
};

/// Values owned by the store.
#[derive(Debug, Clone, Default)]
pub struct MatchState {
    pub teams: TeamRoster,
    pub match_data: MatchData,
}

/// Wire shape of a snapshot: `{match_data, teams}`.
#[derive(Debug, Serialize)]
pub struct SnapshotRef<'a> {
    pub match_data: &'a MatchData,
    pub teams: &'a TeamRoster,
}

impl MatchState {
    /// Borrow the state in snapshot shape.
    pub fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            match_data: &self.match_data,
            teams: &self.teams,
        }
    }
}

/// Holds the state behind one mutex. Holding the guard is what makes a
/// mutation, its persistence write and its publish atomic with respect to
/// every other request.
pub struct StateStore {
    state: Mutex<MatchState>,
    backend: Option<Arc<dyn StateBackend>>,
    degraded: watch::Sender<bool>,
}

impl StateStore {
    /// Memory-only store seeded with defaults.
    pub fn in_memory() -> Self {
        Self::with_state(MatchState::default(), None)
    }

    fn with_state(state: MatchState, backend: Option<Arc<dyn StateBackend>>) -> Self {
        let (degraded, _rx) = watch::channel(false);
        Self {
            state: Mutex::new(state),
            backend,
            degraded,
        }
    }

    /// Hydrate the store from `backend`, falling back to defaults for any
    /// document that is missing or unreadable.
    pub async fn load(backend: Arc<dyn StateBackend>) -> Self {
        let teams = match backend.load_teams().await {
            Ok(Some(stored)) => stored.into_iter().collect(),
            Ok(None) => {
                info!("no stored team list; starting empty");
                TeamRoster::default()
            }
            Err(err) => {
                warn!(error = %err, "failed to load team list; starting empty");
                TeamRoster::default()
            }
        };

        let match_data = match backend.load_match_data().await {
            Ok(Some(stored)) => MatchData::from(stored),
            Ok(None) => {
                info!("no stored match data; using defaults");
                MatchData::default()
            }
            Err(err) => {
                warn!(error = %err, "failed to load match data; using defaults");
                MatchData::default()
            }
        };

        info!(teams = teams.len(), "state store loaded");
        Self::with_state(MatchState { teams, match_data }, Some(backend))
    }

    /// Current team list in roster order.
    pub async fn teams(&self) -> Vec<String> {
        self.state.lock().await.teams.iter().cloned().collect()
    }

    /// Copy of the current match data.
    pub async fn match_data(&self) -> MatchData {
        self.state.lock().await.match_data.clone()
    }

    /// Serialized `{match_data, teams}` snapshot.
    pub async fn snapshot(&self) -> serde_json::Result<String> {
        let guard = self.state.lock().await;
        serde_json::to_string(&guard.snapshot())
    }

    /// Enter the serialization point. Mutations go through the returned guard.
    pub async fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            state: self.state.lock().await,
            store: self,
        }
    }

    /// Whether the last persistence write failed.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Backend in use, if any.
    pub fn backend(&self) -> Option<&Arc<dyn StateBackend>> {
        self.backend.as_ref()
    }

    fn record_write(&self, document: &'static str, result: Result<(), StorageError>) {
        match result {
            Ok(()) => {
                let left = self.degraded.send_if_modified(|degraded| {
                    std::mem::replace(degraded, false)
                });
                if left {
                    info!(document, "persistence write succeeded; leaving degraded mode");
                }
            }
            Err(err) => {
                warn!(document, error = %err, "persistence write failed; keeping in-memory value");
                self.degraded
                    .send_if_modified(|degraded| !std::mem::replace(degraded, true));
            }
        }
    }
}

/// Exclusive access to the state. Every write persists before returning.
pub struct StoreGuard<'a> {
    state: MutexGuard<'a, MatchState>,
    store: &'a StateStore,
}

impl StoreGuard<'_> {
    /// Current roster.
    pub fn teams(&self) -> &TeamRoster {
        &self.state.teams
    }

    /// Current match data.
    pub fn match_data(&self) -> &MatchData {
        &self.state.match_data
    }

    /// Full state, for snapshotting.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Replace the roster and persist it.
    pub async fn replace_teams(&mut self, teams: TeamRoster) {
        self.state.teams = teams;
        self.persist_teams().await;
    }

    /// Replace the whole match data and persist it.
    pub async fn replace_match_data(&mut self, data: MatchData) {
        self.state.match_data = data;
        self.persist_match_data().await;
    }

    /// Shallow-merge `patch` into the match data and persist it.
    pub async fn patch_match_data(&mut self, patch: Map<String, Value>) {
        self.state.match_data.merge(patch);
        self.persist_match_data().await;
    }

    async fn persist_teams(&self) {
        let Some(backend) = self.store.backend.as_ref() else {
            return;
        };
        let entity = self.state.teams.iter().cloned().collect();
        let result = backend.save_teams(entity).await;
        self.store.record_write("teams", result);
    }

    async fn persist_match_data(&self) {
        let Some(backend) = self.store.backend.as_ref() else {
            return;
        };
        let entity = self.state.match_data.as_map().clone();
        let result = backend.save_match_data(entity).await;
        self.store.record_write("match_data", result);
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::dao::{
        models::{MatchDataEntity, TeamsEntity},
        storage::StorageResult,
    };

    /// Records writes and fails them on demand.
    #[derive(Default)]
    struct RecordingBackend {
        teams: StdMutex<Option<TeamsEntity>>,
        match_data: StdMutex<Option<MatchDataEntity>>,
        fail: StdMutex<bool>,
    }

    impl RecordingBackend {
        fn outcome(&self) -> StorageResult<()> {
            if *self.fail.lock().unwrap() {
                Err(StorageError::unavailable(
                    "disk full".into(),
                    std::io::Error::other("disk full"),
                ))
            } else {
                Ok(())
            }
        }
    }

    impl StateBackend for RecordingBackend {
        fn load_teams(&self) -> BoxFuture<'static, StorageResult<Option<TeamsEntity>>> {
            let value = self.teams.lock().unwrap().clone();
            Box::pin(async move { Ok(value) })
        }

        fn load_match_data(&self) -> BoxFuture<'static, StorageResult<Option<MatchDataEntity>>> {
            let value = self.match_data.lock().unwrap().clone();
            Box::pin(async move { Ok(value) })
        }

        fn save_teams(&self, teams: TeamsEntity) -> BoxFuture<'static, StorageResult<()>> {
            let outcome = self.outcome();
            if outcome.is_ok() {
                *self.teams.lock().unwrap() = Some(teams);
            }
            Box::pin(async move { outcome })
        }

        fn save_match_data(&self, data: MatchDataEntity) -> BoxFuture<'static, StorageResult<()>> {
            let outcome = self.outcome();
            if outcome.is_ok() {
                *self.match_data.lock().unwrap() = Some(data);
            }
            Box::pin(async move { outcome })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn load_uses_stored_documents() {
        let backend = Arc::new(RecordingBackend::default());
        *backend.teams.lock().unwrap() = Some(vec!["Beta".into(), "Alpha".into()]);
        *backend.match_data.lock().unwrap() =
            Some(json!({"nextMatch": "Beta vs Alpha"}).as_object().cloned().unwrap());

        let store = StateStore::load(backend).await;

        assert_eq!(store.teams().await, vec!["Beta", "Alpha"]);
        assert_eq!(
            store.match_data().await.get("nextMatch"),
            Some(&json!("Beta vs Alpha"))
        );
    }

    #[tokio::test]
    async fn writes_go_through_to_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let store = StateStore::load(backend.clone()).await;

        {
            let mut guard = store.lock().await;
            guard
                .replace_teams(["Alpha".to_string()].into_iter().collect())
                .await;
            guard
                .patch_match_data(json!({"nextMatch": "x"}).as_object().cloned().unwrap())
                .await;
        }

        assert_eq!(
            backend.teams.lock().unwrap().clone(),
            Some(vec!["Alpha".to_string()])
        );
        let stored = backend.match_data.lock().unwrap().clone().unwrap();
        assert_eq!(stored.get("nextMatch"), Some(&json!("x")));
        assert!(stored.contains_key("court1"));
        assert!(!store.is_degraded());
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_and_enters_degraded_mode() {
        let backend = Arc::new(RecordingBackend::default());
        let store = StateStore::load(backend.clone()).await;
        *backend.fail.lock().unwrap() = true;

        store
            .lock()
            .await
            .replace_teams(["Alpha".to_string()].into_iter().collect())
            .await;

        assert_eq!(store.teams().await, vec!["Alpha"]);
        assert!(backend.teams.lock().unwrap().is_none());
        assert!(store.is_degraded());

        *backend.fail.lock().unwrap() = false;
        store
            .lock()
            .await
            .replace_teams(TeamRoster::default())
            .await;
        assert!(!store.is_degraded());
    }

    #[tokio::test]
    async fn snapshot_has_match_data_and_teams() {
        let store = StateStore::in_memory();
        let raw = store.snapshot().await.unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["teams"], json!([]));
        assert_eq!(value["match_data"]["nextMatch"], json!(""));
        assert!(!raw.contains('\n'));
    }
}
