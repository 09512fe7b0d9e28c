//! Session store port - shared, cross-process session records.
//!
//! The store is the only shared mutable resource of the gateway. It holds one
//! record per live client session, keyed by session id, with a secondary index
//! by principal and a per-record change subscription.
//!
//! ## Exclusivity
//!
//! The store has no native uniqueness constraint on principal. Exclusivity is
//! enforced by [`SessionStore::rotate`], which must replace every existing
//! record of the principal with the new one as a single atomic step: two
//! near-simultaneous sign-ins for the same principal must never both survive.
//!
//! ## Subscriptions
//!
//! [`SessionStore::watch`] yields [`SessionSignal`]s for one record. After
//! (re)connecting, implementations re-observe the current state instead of
//! replaying history: if the record is already gone, the first signal is
//! `Removed { reason: Vanished }`.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;

use crate::domain::foundation::{PrincipalId, SessionId, Timestamp};
use crate::domain::session::{RemovalReason, SessionError, SessionRecord};

/// Change observed on a watched session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    /// The record no longer exists.
    Removed { reason: RemovalReason },
    /// The subscription was re-established and the record still exists.
    Resynced,
}

/// Live stream of signals for one session record.
pub type SessionWatch = Pin<Box<dyn Stream<Item = SessionSignal> + Send>>;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Backend communication error.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<SessionStoreError> for SessionError {
    fn from(err: SessionStoreError) -> Self {
        SessionError::infrastructure(err.to_string())
    }
}

/// Port for the shared session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Atomically replaces every record of `record.principal_id` with `record`.
    ///
    /// Returns the ids of the superseded records. Watchers of those records
    /// receive `Removed { reason: Superseded }`.
    async fn rotate(&self, record: &SessionRecord) -> Result<Vec<SessionId>, SessionStoreError>;

    /// Loads one record.
    async fn get(&self, session_id: &SessionId) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Lists every record of a principal via the secondary index.
    async fn find_by_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<Vec<SessionRecord>, SessionStoreError>;

    /// Deletes one record. Returns `false` if it was already absent.
    ///
    /// Watchers are notified only when a record was actually removed.
    async fn delete(
        &self,
        session_id: &SessionId,
        reason: RemovalReason,
    ) -> Result<bool, SessionStoreError>;

    /// Moves `lastActive` forward. Returns `false` if the record is absent.
    async fn touch(&self, session_id: &SessionId, at: Timestamp) -> Result<bool, SessionStoreError>;

    /// Subscribes to changes of one record.
    async fn watch(&self, session_id: &SessionId) -> Result<SessionWatch, SessionStoreError>;
}
