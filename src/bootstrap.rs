//! Wiring of adapters and services from [`AppConfig`].
//!
//! Shared pieces (transport, session store, workflow gateway, profile
//! resolver) are built once per process. Each client gets its own
//! [`SignInService`] over its own [`SessionExclusivityManager`], since the
//! manager tracks one client's session phase.
//!
//! # Example
//!
//! ```ignore
//! let config = AppConfig::load()?;
//! config.validate()?;
//! telemetry::init_tracing(&config.logging)?;
//!
//! let services = GatewayServices::from_config(&config).await?;
//! let client = services.client();
//! let session = client.sign_in(&services.credentials("jdoe", "secret")?).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::scim::{ScimHttpConfig, ScimHttpTransport};
use crate::adapters::session_store::{
    InMemorySessionStore, RedisSessionStore, RedisSessionStoreConfig,
};
use crate::application::{
    ProfileResolver, ProfileStrategy, SearchByIdentifierStrategy, SelfLookupStrategy,
    SessionExclusivityManager, SignInService, WorkflowGateway,
};
use crate::config::{AppConfig, SessionBackend};
use crate::domain::foundation::{ErrorKind, GatewayError, PrincipalId};
use crate::ports::{Credentials, RemoteTransport, SessionStore, SessionStoreError};

/// Process-wide services.
pub struct GatewayServices {
    base_url: String,
    request_timeout: Duration,
    workflows: Arc<WorkflowGateway>,
    resolver: Arc<ProfileResolver>,
    store: Arc<dyn SessionStore>,
}

impl GatewayServices {
    /// Builds every service from configuration, connecting to Redis when it
    /// backs the session store.
    pub async fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let transport: Arc<dyn RemoteTransport> = Arc::new(
            ScimHttpTransport::new(
                ScimHttpConfig::default()
                    .with_media_type(config.remote.media_type.clone())
                    .with_connect_timeout(config.remote.connect_timeout()),
            )
            .map_err(GatewayError::from)?,
        );

        let store: Arc<dyn SessionStore> = match config.session.backend {
            SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
            SessionBackend::Redis => {
                let store_config = RedisSessionStoreConfig {
                    key_prefix: config.session.key_prefix.clone(),
                    channel_prefix: config.session.channel_prefix.clone(),
                    reconnect_delay: config.session.reconnect_delay(),
                    max_reconnect_delay: config.session.max_reconnect_delay(),
                };
                let connect = RedisSessionStore::connect(&config.redis.url, store_config);
                let store = tokio::time::timeout(config.redis.timeout(), connect)
                    .await
                    .map_err(|_| {
                        GatewayError::new(
                            ErrorKind::SessionStoreUnavailable,
                            "timed out connecting to Redis",
                        )
                    })?
                    .map_err(store_error)?;
                Arc::new(store)
            }
        };

        Ok(Self::with_parts(config, transport, store))
    }

    /// Builds services over an existing transport and store.
    pub fn with_parts(
        config: &AppConfig,
        transport: Arc<dyn RemoteTransport>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let remote = &config.remote;

        let workflows = WorkflowGateway::new(Arc::clone(&transport))
            .with_invoke_path(remote.invoke_path.clone())
            .with_schema(remote.invocation_schema.clone());

        let strategies: Vec<Arc<dyn ProfileStrategy>> = vec![
            Arc::new(SelfLookupStrategy::new(remote.self_path.clone())),
            Arc::new(SearchByIdentifierStrategy::new(
                remote.users_path.clone(),
                remote.identifier_attribute.clone(),
            )),
        ];
        let resolver = ProfileResolver::new(transport, remote.resolve_timeout())
            .with_strategies(strategies);

        tracing::info!(
            base_url = %remote.base_url,
            session_backend = ?config.session.backend,
            "Gateway services ready"
        );

        Self {
            base_url: remote.base_url.clone(),
            request_timeout: remote.request_timeout(),
            workflows: Arc::new(workflows),
            resolver: Arc::new(resolver),
            store,
        }
    }

    /// Credentials for a principal against the configured remote.
    pub fn credentials(
        &self,
        principal_id: &str,
        secret: impl Into<String>,
    ) -> Result<Credentials, GatewayError> {
        let principal_id = PrincipalId::new(principal_id)?;
        Ok(Credentials::new(self.base_url.clone(), principal_id, secret)?)
    }

    /// A sign-in service with its own session manager, for one client.
    pub fn client(&self) -> SignInService {
        SignInService::new(
            Arc::clone(&self.resolver),
            Arc::new(SessionExclusivityManager::new(Arc::clone(&self.store))),
        )
    }

    pub fn workflows(&self) -> &Arc<WorkflowGateway> {
        &self.workflows
    }

    pub fn resolver(&self) -> &Arc<ProfileResolver> {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Configured timeout for workflow invocations.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

fn store_error(err: SessionStoreError) -> GatewayError {
    GatewayError::new(ErrorKind::SessionStoreUnavailable, err.to_string())
}
