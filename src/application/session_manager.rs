//! SessionExclusivityManager - One live session per principal.
//!
//! Each client process owns one manager. Creating a session rotates the
//! principal's records in the shared store in one atomic step, so any other
//! client still holding an older session sees its record disappear and is
//! notified through [`SessionExclusivityManager::monitor`].
//!
//! ```text
//! Unauthenticated -> Authenticating -> Active -> Unauthenticated
//! ```
//!
//! # Example
//!
//! ```ignore
//! let manager = SessionExclusivityManager::new(store);
//! let context = manager.create_session(principal, "jdoe@example.com").await?;
//! let monitor = manager
//!     .monitor(context.session_id, |reason| tracing::info!(%reason, "signed out elsewhere"))
//!     .await?;
//! ```

use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::domain::foundation::{PrincipalId, SessionId, SessionPhase, StateMachine, Timestamp};
use crate::domain::session::{RemovalReason, SessionContext, SessionError, SessionRecord};
use crate::ports::{SessionSignal, SessionStore};

#[derive(Debug, Default)]
struct ManagerState {
    phase: SessionPhase,
    current: Option<SessionContext>,
    /// Id of the authentication attempt in flight, if any.
    attempt: Option<u64>,
    next_attempt: u64,
}

impl ManagerState {
    fn transition(&mut self, target: SessionPhase) -> Result<(), SessionError> {
        self.phase = self.phase.transition_to(target)?;
        Ok(())
    }

    /// Drops the current session if it is `session_id`.
    fn clear_if_current(&mut self, session_id: &SessionId) -> bool {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|ctx| ctx.session_id == *session_id);
        if is_current {
            self.current = None;
            self.phase = SessionPhase::Unauthenticated;
        }
        is_current
    }

    fn owns_attempt(&self, id: u64) -> bool {
        self.attempt == Some(id) && self.phase == SessionPhase::Authenticating
    }
}

fn lock(state: &Mutex<ManagerState>) -> MutexGuard<'_, ManagerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running session subscription.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct SessionMonitor {
    session_id: SessionId,
    task: JoinHandle<()>,
}

impl SessionMonitor {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// True once the removal callback has run or the subscription ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the subscription without invoking the callback.
    pub fn unsubscribe(self) {
        // Drop aborts the task.
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// An authentication attempt in flight on one manager.
///
/// Only one attempt exists per manager at a time. Dropping an attempt that
/// never committed returns the manager to `Unauthenticated`, and deletes the
/// record it may already have written to the store.
#[must_use = "dropping an attempt abandons it"]
pub struct AuthAttempt {
    id: u64,
    state: Arc<Mutex<ManagerState>>,
    store: Arc<dyn SessionStore>,
    pending: Option<SessionId>,
    committed: bool,
}

impl std::fmt::Debug for AuthAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthAttempt")
            .field("id", &self.id)
            .field("pending", &self.pending)
            .field("committed", &self.committed)
            .finish()
    }
}

impl AuthAttempt {
    /// Ends the attempt without a session.
    pub fn abandon(self) {}
}

impl Drop for AuthAttempt {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        {
            let mut state = lock(&self.state);
            if state.owns_attempt(self.id) {
                state.attempt = None;
                state.phase = SessionPhase::Unauthenticated;
            }
        }

        let Some(session_id) = self.pending.take() else {
            return;
        };
        tracing::warn!(%session_id, "Authentication abandoned, removing pending session");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                handle.spawn(async move {
                    if let Err(e) = store.delete(&session_id, RemovalReason::SignedOut).await {
                        tracing::error!(%session_id, error = %e, "Failed to remove abandoned session");
                    }
                });
            }
            Err(_) => {
                tracing::error!(%session_id, "No runtime to remove abandoned session");
            }
        }
    }
}

/// Enforces a single active session per principal across processes.
pub struct SessionExclusivityManager {
    store: Arc<dyn SessionStore>,
    state: Arc<Mutex<ManagerState>>,
}

impl SessionExclusivityManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(ManagerState::default())),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        lock(&self.state).phase
    }

    /// Context of the session this client currently holds.
    pub fn current_session(&self) -> Option<SessionContext> {
        lock(&self.state).current.clone()
    }

    /// Starts an authentication attempt.
    ///
    /// Fails unless the client is `Unauthenticated`, so a second concurrent
    /// attempt on the same manager is rejected.
    pub fn begin_authentication(&self) -> Result<AuthAttempt, SessionError> {
        let mut state = lock(&self.state);
        if state.phase != SessionPhase::Unauthenticated {
            return Err(SessionError::invalid_state(format!(
                "cannot start authentication while {}",
                state.phase
            )));
        }
        state.transition(SessionPhase::Authenticating)?;
        let id = state.next_attempt;
        state.next_attempt += 1;
        state.attempt = Some(id);

        Ok(AuthAttempt {
            id,
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
            pending: None,
            committed: false,
        })
    }

    /// Creates a session for `principal_id`, superseding every other live
    /// session of that principal.
    ///
    /// Runs a whole authentication attempt: fails with `InvalidState` unless
    /// the client is `Unauthenticated`.
    pub async fn create_session(
        &self,
        principal_id: PrincipalId,
        principal_email: impl Into<String>,
    ) -> Result<SessionContext, SessionError> {
        let attempt = self.begin_authentication()?;
        self.complete_authentication(attempt, principal_id, principal_email)
            .await
    }

    /// Finishes `attempt` by creating the principal's session.
    pub async fn complete_authentication(
        &self,
        mut attempt: AuthAttempt,
        principal_id: PrincipalId,
        principal_email: impl Into<String>,
    ) -> Result<SessionContext, SessionError> {
        if !Arc::ptr_eq(&attempt.state, &self.state) {
            return Err(SessionError::invalid_state(
                "authentication attempt belongs to another client",
            ));
        }

        let record = SessionRecord::new(principal_id, principal_email)?;

        attempt.pending = Some(record.session_id);
        let superseded = self.store.rotate(&record).await.map_err(|e| {
            tracing::error!(
                principal = %record.principal_id,
                error = %e,
                "Failed to rotate session"
            );
            e
        })?;

        let context = record.context();
        {
            let mut state = lock(&self.state);
            if !state.owns_attempt(attempt.id) {
                // Dropping the attempt removes the record written above.
                return Err(SessionError::invalid_state(format!(
                    "authentication attempt superseded while {}",
                    state.phase
                )));
            }
            state.transition(SessionPhase::Active)?;
            state.attempt = None;
            state.current = Some(context.clone());
            attempt.committed = true;
        }

        tracing::info!(
            session_id = %context.session_id,
            principal = %context.principal_id,
            superseded = superseded.len(),
            "Session created"
        );

        Ok(context)
    }

    /// Subscribes to removal of `session_id`.
    ///
    /// `on_removed` runs at most once, on the first observed removal; later
    /// notifications are ignored. If this client holds that session, it
    /// returns to `Unauthenticated` before the callback runs.
    pub async fn monitor<F>(
        &self,
        session_id: SessionId,
        on_removed: F,
    ) -> Result<SessionMonitor, SessionError>
    where
        F: FnOnce(RemovalReason) + Send + 'static,
    {
        let mut signals = self.store.watch(&session_id).await?;
        let state = Arc::clone(&self.state);

        let task = tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                match signal {
                    SessionSignal::Resynced => {
                        tracing::debug!(%session_id, "Session subscription resynced");
                    }
                    SessionSignal::Removed { reason } => {
                        lock(&state).clear_if_current(&session_id);
                        tracing::info!(%session_id, %reason, "Session removed");
                        on_removed(reason);
                        return;
                    }
                }
            }
        });

        Ok(SessionMonitor { session_id, task })
    }

    /// Deletes `session_id`. Idempotent: returns `false` if it was already
    /// gone.
    pub async fn terminate(&self, session_id: &SessionId) -> Result<bool, SessionError> {
        let removed = self.store.delete(session_id, RemovalReason::SignedOut).await?;
        lock(&self.state).clear_if_current(session_id);
        if removed {
            tracing::info!(%session_id, "Session terminated");
        }
        Ok(removed)
    }

    /// Refreshes `lastActive`. Returns `false` if the session no longer exists.
    pub async fn touch(&self, context: &SessionContext) -> Result<bool, SessionError> {
        Ok(self.store.touch(&context.session_id, Timestamp::now()).await?)
    }
}
