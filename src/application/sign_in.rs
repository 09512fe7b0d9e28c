//! SignInService - Credential check, profile resolution and session creation.

use std::sync::Arc;

use crate::domain::foundation::GatewayError;
use crate::domain::identity::ResolvedProfile;
use crate::domain::session::SessionContext;
use crate::ports::Credentials;

use super::{ProfileResolver, SessionExclusivityManager};

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub context: SessionContext,
    pub profile: ResolvedProfile,
}

/// Signs a client in and out.
///
/// Profile resolution doubles as the credential check: the remote rejects bad
/// credentials on every strategy.
pub struct SignInService {
    resolver: Arc<ProfileResolver>,
    sessions: Arc<SessionExclusivityManager>,
}

impl SignInService {
    pub fn new(resolver: Arc<ProfileResolver>, sessions: Arc<SessionExclusivityManager>) -> Self {
        Self { resolver, sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionExclusivityManager> {
        &self.sessions
    }

    /// Signs in with `credentials`.
    ///
    /// Dropping the returned future before it completes abandons the attempt
    /// and leaves the client `Unauthenticated`.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthenticatedSession, GatewayError> {
        let attempt = self.sessions.begin_authentication()?;

        let profile = self.resolver.resolve(credentials).await?;

        // Principals without an email on file fall back to their id.
        let email = profile
            .primary_email()
            .map(str::to_string)
            .unwrap_or_else(|| credentials.principal_id().to_string());

        let context = self
            .sessions
            .complete_authentication(attempt, credentials.principal_id().clone(), email)
            .await?;

        Ok(AuthenticatedSession { context, profile })
    }

    /// Ends the session. Signing out an already-removed session succeeds.
    pub async fn sign_out(&self, context: &SessionContext) -> Result<(), GatewayError> {
        self.sessions.terminate(&context.session_id).await?;
        Ok(())
    }
}
