//! In-memory session store.
//!
//! Single-process implementation of the `SessionStore` port. Rotation runs
//! under one write lock; removals fan out over a broadcast channel.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(InMemorySessionStore::new());
//! let superseded = store.rotate(&record).await?;
//! let mut watch = store.watch(&record.session_id).await?;
//! ```

use async_trait::async_trait;
use futures::stream;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;

use crate::domain::foundation::{PrincipalId, SessionId, Timestamp};
use crate::domain::session::{RemovalReason, SessionRecord};
use crate::ports::{SessionSignal, SessionStore, SessionStoreError, SessionWatch};

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<SessionId, SessionRecord>,
    by_principal: HashMap<PrincipalId, HashSet<SessionId>>,
}

impl StoreState {
    fn remove(&mut self, session_id: &SessionId) -> Option<SessionRecord> {
        let record = self.records.remove(session_id)?;
        if let Some(ids) = self.by_principal.get_mut(&record.principal_id) {
            ids.remove(session_id);
            if ids.is_empty() {
                self.by_principal.remove(&record.principal_id);
            }
        }
        Some(record)
    }
}

/// In-memory `SessionStore`.
///
/// Clones share the same state, so several managers built over clones behave
/// like several processes sharing one store.
#[derive(Debug, Clone)]
pub struct InMemorySessionStore {
    state: Arc<RwLock<StoreState>>,
    removals: broadcast::Sender<(SessionId, RemovalReason)>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_channel_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a store whose removal channel buffers `capacity` events per
    /// watcher before it lags.
    pub fn with_channel_capacity(capacity: usize) -> Self {
        let (removals, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            removals,
        }
    }

    /// Number of live records.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn notify(&self, session_id: SessionId, reason: RemovalReason) {
        // No receivers is fine: nobody is watching.
        let _ = self.removals.send((session_id, reason));
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

struct WatchCursor {
    session_id: SessionId,
    receiver: broadcast::Receiver<(SessionId, RemovalReason)>,
    state: Arc<RwLock<StoreState>>,
    pending: Option<SessionSignal>,
}

impl WatchCursor {
    async fn exists(&self) -> bool {
        self.state.read().await.records.contains_key(&self.session_id)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn rotate(&self, record: &SessionRecord) -> Result<Vec<SessionId>, SessionStoreError> {
        let mut state = self.state.write().await;

        let existing: Vec<SessionId> = state
            .by_principal
            .get(&record.principal_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();

        let mut superseded = Vec::with_capacity(existing.len());
        for id in existing {
            if id != record.session_id && state.remove(&id).is_some() {
                superseded.push(id);
            }
        }

        state.records.insert(record.session_id, record.clone());
        state
            .by_principal
            .entry(record.principal_id.clone())
            .or_default()
            .insert(record.session_id);

        for id in &superseded {
            self.notify(*id, RemovalReason::Superseded);
        }

        Ok(superseded)
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError> {
        Ok(self.state.read().await.records.get(session_id).cloned())
    }

    async fn find_by_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<SessionRecord>, SessionStoreError> {
        let state = self.state.read().await;
        let records = state
            .by_principal
            .get(principal_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.records.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn delete(
        &self,
        session_id: &SessionId,
        reason: RemovalReason,
    ) -> Result<bool, SessionStoreError> {
        let removed = self.state.write().await.remove(session_id).is_some();
        if removed {
            self.notify(*session_id, reason);
        }
        Ok(removed)
    }

    async fn touch(&self, session_id: &SessionId, at: Timestamp) -> Result<bool, SessionStoreError> {
        let mut state = self.state.write().await;
        match state.records.get_mut(session_id) {
            Some(record) => {
                *record = record.touched(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn watch(&self, session_id: &SessionId) -> Result<SessionWatch, SessionStoreError> {
        // Subscribe before looking, so a removal between the two is not lost.
        let receiver = self.removals.subscribe();
        let exists = self.state.read().await.records.contains_key(session_id);

        let cursor = WatchCursor {
            session_id: *session_id,
            receiver,
            state: Arc::clone(&self.state),
            pending: (!exists).then_some(SessionSignal::Removed {
                reason: RemovalReason::Vanished,
            }),
        };

        let signals = stream::unfold(Some(cursor), |cursor| async move {
            let mut cursor = cursor?;
            if let Some(signal) = cursor.pending.take() {
                return Some((signal, None));
            }
            loop {
                match cursor.receiver.recv().await {
                    Ok((id, reason)) if id == cursor.session_id => {
                        return Some((SessionSignal::Removed { reason }, None));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(
                            session_id = %cursor.session_id,
                            skipped,
                            "Session watch lagged, re-checking record"
                        );
                        if cursor.exists().await {
                            return Some((SessionSignal::Resynced, Some(cursor)));
                        }
                        return Some((
                            SessionSignal::Removed {
                                reason: RemovalReason::Vanished,
                            },
                            None,
                        ));
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        });

        Ok(Box::pin(signals))
    }
}
