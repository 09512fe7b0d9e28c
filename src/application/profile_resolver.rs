//! ProfileResolver - Races independent identity resolution strategies.
//!
//! The remote "who am I" endpoint is not reliable on every deployment, so
//! several strategies run at once, each under its own timeout. The first
//! success wins and the others are cancelled by dropping their futures. If
//! every strategy fails, the failures are classified by fixed precedence
//! (see [`classify`]), independent of the order in which they arrived.
//!
//! # Example
//!
//! ```ignore
//! let resolver = ProfileResolver::new(transport, Duration::from_secs(10));
//! match resolver.resolve(&credentials).await {
//!     Ok(profile) => println!("signed in as {:?}", profile.user_name()),
//!     Err(ResolveError::InvalidCredentials { .. }) => { /* re-prompt */ }
//!     Err(other) => return Err(other.into()),
//! }
//! ```

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::identity::{classify, FailureKind, ResolveError, ResolvedProfile, StrategyFailure};
use crate::ports::{Credentials, RemoteTransport, TransportError, TransportRequest, TransportResponse};

/// Default path of the self-profile endpoint.
pub const DEFAULT_SELF_PATH: &str = "Me";
/// Default path of the user search endpoint.
pub const DEFAULT_USERS_PATH: &str = "Users";
/// Default attribute the principal id is matched against.
pub const DEFAULT_IDENTIFIER_ATTRIBUTE: &str = "userName";

const MAX_BODY_IN_MESSAGE: usize = 200;

/// One independent way of resolving the caller's profile.
#[async_trait]
pub trait ProfileStrategy: Send + Sync {
    /// Stable name used in failure summaries and logs.
    fn name(&self) -> &str;

    async fn resolve(
        &self,
        transport: &dyn RemoteTransport,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<ResolvedProfile, StrategyFailure>;
}

/// `GET Me` - direct self-profile lookup.
#[derive(Debug, Clone)]
pub struct SelfLookupStrategy {
    path: String,
}

impl SelfLookupStrategy {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for SelfLookupStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_PATH)
    }
}

#[async_trait]
impl ProfileStrategy for SelfLookupStrategy {
    fn name(&self) -> &str {
        "self_lookup"
    }

    async fn resolve(
        &self,
        transport: &dyn RemoteTransport,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<ResolvedProfile, StrategyFailure> {
        let response = transport
            .call(credentials, TransportRequest::get(self.path.clone(), timeout))
            .await
            .map_err(|e| transport_failure(self.name(), e))?;

        let body = parse_success(self.name(), response)?;
        if !body.is_object() {
            return Err(StrategyFailure::new(
                self.name(),
                FailureKind::MalformedResponse,
                "profile is not a JSON object",
            ));
        }
        Ok(ResolvedProfile::new(body, self.name()))
    }
}

/// `GET Users?filter=<attribute> eq "<principal>"` - first match wins.
#[derive(Debug, Clone)]
pub struct SearchByIdentifierStrategy {
    path: String,
    attribute: String,
}

impl SearchByIdentifierStrategy {
    pub fn new(path: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attribute: attribute.into(),
        }
    }

    /// SCIM filter for the principal, with quotes and backslashes escaped.
    pub fn filter_for(&self, principal: &str) -> String {
        let escaped = principal.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{} eq \"{}\"", self.attribute, escaped)
    }
}

impl Default for SearchByIdentifierStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_USERS_PATH, DEFAULT_IDENTIFIER_ATTRIBUTE)
    }
}

#[async_trait]
impl ProfileStrategy for SearchByIdentifierStrategy {
    fn name(&self) -> &str {
        "search_by_identifier"
    }

    async fn resolve(
        &self,
        transport: &dyn RemoteTransport,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<ResolvedProfile, StrategyFailure> {
        let request = TransportRequest::get(self.path.clone(), timeout)
            .with_query("filter", self.filter_for(credentials.principal_id().as_str()));

        let response = transport
            .call(credentials, request)
            .await
            .map_err(|e| transport_failure(self.name(), e))?;

        let body = parse_success(self.name(), response)?;
        let resources = match body.get("Resources") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(StrategyFailure::new(
                    self.name(),
                    FailureKind::MalformedResponse,
                    "Resources is not a list",
                ))
            }
        };

        match resources.into_iter().next() {
            Some(first) if first.is_object() => Ok(ResolvedProfile::new(first, self.name())),
            Some(_) => Err(StrategyFailure::new(
                self.name(),
                FailureKind::MalformedResponse,
                "search result is not a JSON object",
            )),
            None => Err(StrategyFailure::new(
                self.name(),
                FailureKind::NotFound,
                format!("no user matches {}", self.filter_for(credentials.principal_id().as_str())),
            )),
        }
    }
}

fn transport_failure(strategy: &str, err: TransportError) -> StrategyFailure {
    let kind = match err {
        TransportError::Timeout { .. } => FailureKind::Timeout,
        TransportError::Network(_) => FailureKind::Network,
    };
    StrategyFailure::new(strategy, kind, err.to_string())
}

fn parse_success(strategy: &str, response: TransportResponse) -> Result<Value, StrategyFailure> {
    if !response.is_success() {
        let mut body = response.body;
        if body.len() > MAX_BODY_IN_MESSAGE {
            let mut cut = MAX_BODY_IN_MESSAGE;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(StrategyFailure::new(
            strategy,
            FailureKind::from_status(response.status),
            format!("HTTP {}: {}", response.status, body),
        ));
    }
    serde_json::from_str(&response.body)
        .map_err(|e| StrategyFailure::new(strategy, FailureKind::MalformedResponse, e.to_string()))
}

/// Races profile strategies against the remote service.
pub struct ProfileResolver {
    transport: Arc<dyn RemoteTransport>,
    strategies: Vec<Arc<dyn ProfileStrategy>>,
    strategy_timeout: Duration,
}

impl ProfileResolver {
    /// Creates a resolver with the self-lookup and search strategies.
    pub fn new(transport: Arc<dyn RemoteTransport>, strategy_timeout: Duration) -> Self {
        Self {
            transport,
            strategies: vec![
                Arc::new(SelfLookupStrategy::default()),
                Arc::new(SearchByIdentifierStrategy::default()),
            ],
            strategy_timeout,
        }
    }

    /// Replaces the strategy set.
    pub fn with_strategies(mut self, strategies: Vec<Arc<dyn ProfileStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategy_timeout(&self) -> Duration {
        self.strategy_timeout
    }

    /// Resolves the caller's profile with the configured strategies.
    pub async fn resolve(&self, credentials: &Credentials) -> Result<ResolvedProfile, ResolveError> {
        self.resolve_with(credentials, &self.strategies, self.strategy_timeout)
            .await
    }

    /// Resolves with an explicit strategy set and per-strategy timeout.
    ///
    /// An empty strategy set fails with `AllStrategiesFailed` and no
    /// individual failures.
    pub async fn resolve_with(
        &self,
        credentials: &Credentials,
        strategies: &[Arc<dyn ProfileStrategy>],
        timeout: Duration,
    ) -> Result<ResolvedProfile, ResolveError> {
        let transport = self.transport.as_ref();

        let mut pending: FuturesUnordered<_> = strategies
            .iter()
            .map(|strategy| async move {
                match tokio::time::timeout(timeout, strategy.resolve(transport, credentials, timeout))
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(StrategyFailure::new(
                        strategy.name(),
                        FailureKind::Timeout,
                        format!("no result within {}ms", timeout.as_millis()),
                    )),
                }
            })
            .collect();

        let mut failures = Vec::with_capacity(strategies.len());
        while let Some(outcome) = pending.next().await {
            match outcome {
                Ok(profile) => {
                    tracing::debug!(
                        strategy = profile.source(),
                        principal = %credentials.principal_id(),
                        cancelled = pending.len(),
                        "Profile resolved"
                    );
                    // Dropping `pending` cancels the losing strategies.
                    return Ok(profile);
                }
                Err(failure) => {
                    tracing::warn!(
                        strategy = %failure.strategy,
                        kind = %failure.kind,
                        "Profile strategy failed: {}",
                        failure.message
                    );
                    failures.push(failure);
                }
            }
        }

        let err = classify(failures);
        tracing::warn!(
            principal = %credentials.principal_id(),
            kind = %err.kind(),
            "Profile resolution failed"
        );
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scim::MockTransport;
    use crate::domain::foundation::PrincipalId;
    use crate::ports::HttpMethod;

    fn credentials() -> Credentials {
        Credentials::new("https://iam.example.com", PrincipalId::new("jdoe").unwrap(), "secret").unwrap()
    }

    fn resolver(transport: &MockTransport) -> ProfileResolver {
        ProfileResolver::new(Arc::new(transport.clone()), Duration::from_secs(2))
    }

    const ME: &str = r#"{"id": "1", "userName": "jdoe", "emails": [{"value": "jdoe@example.com"}]}"#;
    const SEARCH_HIT: &str = r#"{"totalResults": 1, "Resources": [{"id": "1", "userName": "jdoe"}]}"#;

    #[tokio::test]
    async fn fastest_success_wins_and_loser_is_cancelled() {
        let transport = MockTransport::new()
            .respond_after(Duration::from_millis(10), HttpMethod::Get, DEFAULT_SELF_PATH, 200, ME)
            .respond_after(
                Duration::from_millis(500),
                HttpMethod::Get,
                DEFAULT_USERS_PATH,
                200,
                SEARCH_HIT,
            );

        let profile = resolver(&transport).resolve(&credentials()).await.unwrap();
        assert_eq!(profile.source(), "self_lookup");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(transport.completed_calls(), 1);
    }

    #[tokio::test]
    async fn success_wins_over_earlier_failure() {
        let transport = MockTransport::new()
            .respond(HttpMethod::Get, DEFAULT_SELF_PATH, 403, "forbidden")
            .respond_after(
                Duration::from_millis(30),
                HttpMethod::Get,
                DEFAULT_USERS_PATH,
                200,
                SEARCH_HIT,
            );

        let profile = resolver(&transport).resolve(&credentials()).await.unwrap();
        assert_eq!(profile.source(), "search_by_identifier");
        assert_eq!(profile.user_name(), Some("jdoe"));
    }

    #[tokio::test]
    async fn permission_denied_beats_network_error_in_either_order() {
        for (fast, slow) in [(DEFAULT_SELF_PATH, DEFAULT_USERS_PATH), (DEFAULT_USERS_PATH, DEFAULT_SELF_PATH)] {
            let transport = MockTransport::new()
                .respond(HttpMethod::Get, fast, 403, "forbidden")
                .fail_after(
                    Duration::from_millis(20),
                    HttpMethod::Get,
                    slow,
                    TransportError::network("connection reset"),
                );

            let err = resolver(&transport).resolve(&credentials()).await.unwrap_err();
            assert!(
                matches!(err, ResolveError::PermissionDenied { .. }),
                "fast={} got {:?}",
                fast,
                err
            );
            assert_eq!(err.failures().len(), 2);
        }
    }

    #[tokio::test]
    async fn unauthorized_is_invalid_credentials() {
        let transport = MockTransport::new()
            .respond(HttpMethod::Get, DEFAULT_SELF_PATH, 401, "")
            .respond(HttpMethod::Get, DEFAULT_USERS_PATH, 500, "oops");

        let err = resolver(&transport).resolve(&credentials()).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidCredentials { .. }));
    }

    #[tokio::test]
    async fn empty_search_and_missing_me_is_not_found() {
        let transport = MockTransport::new()
            .respond(HttpMethod::Get, DEFAULT_SELF_PATH, 404, "")
            .respond(HttpMethod::Get, DEFAULT_USERS_PATH, 200, r#"{"Resources": []}"#);

        let err = resolver(&transport).resolve(&credentials()).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[tokio::test]
    async fn slow_strategies_time_out_individually() {
        let transport = MockTransport::new()
            .respond_after(Duration::from_secs(5), HttpMethod::Get, DEFAULT_SELF_PATH, 200, ME)
            .respond(HttpMethod::Get, DEFAULT_USERS_PATH, 502, "bad gateway");

        let err = ProfileResolver::new(Arc::new(transport), Duration::from_millis(50))
            .resolve(&credentials())
            .await
            .unwrap_err();

        let ResolveError::AllStrategiesFailed { failures } = err else {
            panic!("expected AllStrategiesFailed");
        };
        let kinds: Vec<_> = failures.iter().map(|f| f.kind.clone()).collect();
        assert!(kinds.contains(&FailureKind::Timeout));
        assert!(kinds.contains(&FailureKind::Remote { status: 502 }));
    }

    #[tokio::test]
    async fn empty_strategy_set_fails_without_calls() {
        let transport = MockTransport::new();
        let err = resolver(&transport)
            .with_strategies(Vec::new())
            .resolve(&credentials())
            .await
            .unwrap_err();

        assert_eq!(err, ResolveError::AllStrategiesFailed { failures: vec![] });
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn search_sends_escaped_filter() {
        let transport = MockTransport::new().respond(HttpMethod::Get, DEFAULT_USERS_PATH, 200, SEARCH_HIT);
        let creds = Credentials::new("https://iam.example.com", PrincipalId::new("a\"b").unwrap(), "s").unwrap();

        SearchByIdentifierStrategy::default()
            .resolve(&transport, &creds, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(
            transport.calls()[0].query,
            vec![("filter".to_string(), "userName eq \"a\\\"b\"".to_string())]
        );
    }

    #[tokio::test]
    async fn self_lookup_rejects_non_object_profile() {
        let transport = MockTransport::new().respond(HttpMethod::Get, DEFAULT_SELF_PATH, 200, "[]");
        let failure = SelfLookupStrategy::default()
            .resolve(&transport, &credentials(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::MalformedResponse);
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let failure = parse_success("s", TransportResponse::new(500, "x".repeat(1000))).unwrap_err();
        assert!(failure.message.len() < 300);
        assert_eq!(failure.kind, FailureKind::Remote { status: 500 });
    }
}
