//! Mock transport for testing.
//!
//! Scripted responses per `(method, path)`, simulated latency for timeout and
//! cancellation testing, error injection, and call tracking.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new()
//!     .respond(HttpMethod::Get, "Me", 200, r#"{"id": "1"}"#)
//!     .respond_after(Duration::from_millis(50), HttpMethod::Get, "Users", 403, "forbidden");
//!
//! let response = transport.call(&credentials, request).await?;
//! assert_eq!(transport.calls().len(), 1);
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    Credentials, HttpMethod, RemoteTransport, TransportError, TransportRequest, TransportResponse,
};

/// What a scripted route answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(TransportResponse),
    Fail(TransportError),
}

#[derive(Debug, Clone)]
struct MockRoute {
    method: HttpMethod,
    path: String,
    reply: MockReply,
    delay: Duration,
}

/// Scripted `RemoteTransport` for tests.
///
/// Routes match on method and path (query ignored); the first matching route
/// wins. Unmatched calls get a 404.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<Vec<MockRoute>>>,
    calls: Arc<Mutex<Vec<TransportRequest>>>,
    authorizations: Arc<Mutex<Vec<String>>>,
    completed: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an immediate response.
    pub fn respond(
        self,
        method: HttpMethod,
        path: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.respond_after(Duration::ZERO, method, path, status, body)
    }

    /// Adds a response delivered after `delay`.
    pub fn respond_after(
        self,
        delay: Duration,
        method: HttpMethod,
        path: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.route(
            method,
            path,
            MockReply::Respond(TransportResponse::new(status, body)),
            delay,
        )
    }

    /// Adds a transport failure delivered after `delay`.
    pub fn fail_after(
        self,
        delay: Duration,
        method: HttpMethod,
        path: impl Into<String>,
        error: TransportError,
    ) -> Self {
        self.route(method, path, MockReply::Fail(error), delay)
    }

    fn route(self, method: HttpMethod, path: impl Into<String>, reply: MockReply, delay: Duration) -> Self {
        lock(&self.routes).push(MockRoute {
            method,
            path: path.into(),
            reply,
            delay,
        });
        self
    }

    /// Every request received, in arrival order.
    pub fn calls(&self) -> Vec<TransportRequest> {
        lock(&self.calls).clone()
    }

    /// Authorization headers the calls would have carried.
    pub fn authorizations(&self) -> Vec<String> {
        lock(&self.authorizations).clone()
    }

    /// Number of calls that ran to completion (not cancelled).
    pub fn completed_calls(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn find(&self, method: HttpMethod, path: &str) -> Option<MockRoute> {
        let path = path.trim_start_matches('/');
        lock(&self.routes)
            .iter()
            .find(|r| r.method == method && r.path.trim_start_matches('/') == path)
            .cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RemoteTransport for MockTransport {
    async fn call(
        &self,
        credentials: &Credentials,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        lock(&self.calls).push(request.clone());
        lock(&self.authorizations).push(credentials.basic_authorization());

        let route = self.find(request.method, &request.path);
        let delay = route.as_ref().map(|r| r.delay).unwrap_or_default();

        if delay > request.timeout {
            sleep(request.timeout).await;
            return Err(TransportError::timeout(request.timeout));
        }
        if !delay.is_zero() {
            sleep(delay).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);

        match route.map(|r| r.reply) {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(error)) => Err(error),
            None => Ok(TransportResponse::new(404, "no route")),
        }
    }
}
