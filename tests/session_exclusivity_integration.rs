//! Integration tests for single-active-session enforcement.
//!
//! Several clients share one in-memory store, standing in for several
//! processes sharing Redis:
//! 1. A new sign-in supersedes every older session of the principal
//! 2. Superseded clients are notified exactly once
//! 3. Concurrent sign-ins for one principal leave exactly one record

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use scim_gateway::adapters::scim::MockTransport;
use scim_gateway::adapters::session_store::InMemorySessionStore;
use scim_gateway::application::SessionExclusivityManager;
use scim_gateway::bootstrap::GatewayServices;
use scim_gateway::config::{AppConfig, RemoteConfig, SessionBackend, SessionConfig};
use scim_gateway::domain::foundation::{PrincipalId, SessionPhase};
use scim_gateway::domain::session::RemovalReason;
use scim_gateway::ports::{HttpMethod, SessionStore};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn principal(name: &str) -> PrincipalId {
    PrincipalId::new(name).unwrap()
}

fn client(store: &InMemorySessionStore) -> SessionExclusivityManager {
    SessionExclusivityManager::new(Arc::new(store.clone()))
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<RemovalReason>) -> Option<RemovalReason> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no notification in time")
}

fn services(store: &InMemorySessionStore) -> GatewayServices {
    let config = AppConfig {
        environment: Default::default(),
        remote: RemoteConfig {
            base_url: "https://iam.example.com/scim/v2".to_string(),
            ..Default::default()
        },
        redis: Default::default(),
        session: SessionConfig {
            backend: SessionBackend::Memory,
            ..Default::default()
        },
        logging: Default::default(),
    };
    let transport = MockTransport::new().respond(
        HttpMethod::Get,
        "Me",
        200,
        r#"{"userName": "jdoe", "emails": [{"value": "jdoe@example.com"}]}"#,
    );
    GatewayServices::with_parts(&config, Arc::new(transport), Arc::new(store.clone()))
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn sequential_sessions_leave_only_the_second() {
    let store = InMemorySessionStore::new();

    let first = client(&store)
        .create_session(principal("jdoe"), "jdoe@example.com")
        .await
        .unwrap();
    let second = client(&store)
        .create_session(principal("jdoe"), "jdoe@example.com")
        .await
        .unwrap();

    assert_ne!(first.session_id, second.session_id);
    assert!(store.get(&first.session_id).await.unwrap().is_none());

    let records = store.find_by_principal(&principal("jdoe")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].session_id, second.session_id);
}

#[tokio::test]
async fn superseded_client_is_notified_exactly_once() {
    let store = InMemorySessionStore::new();
    let laptop = client(&store);
    let phone = client(&store);

    let laptop_session = laptop
        .create_session(principal("jdoe"), "jdoe@example.com")
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _monitor = laptop
        .monitor(laptop_session.session_id, move |reason| {
            let _ = tx.send(reason);
        })
        .await
        .unwrap();

    phone
        .create_session(principal("jdoe"), "jdoe@example.com")
        .await
        .unwrap();

    assert_eq!(recv(&mut rx).await, Some(RemovalReason::Superseded));
    assert_eq!(laptop.phase(), SessionPhase::Unauthenticated);
    assert_eq!(phone.phase(), SessionPhase::Active);

    // A later deletion of the same id is a no-op and notifies nobody.
    assert!(!store
        .delete(&laptop_session.session_id, RemovalReason::SignedOut)
        .await
        .unwrap());
    assert_eq!(recv(&mut rx).await, None);
}

#[tokio::test]
async fn sign_out_notifies_own_monitor_once() {
    let store = InMemorySessionStore::new();
    let manager = client(&store);
    let context = manager
        .create_session(principal("jdoe"), "jdoe@example.com")
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _monitor = manager
        .monitor(context.session_id, move |reason| {
            let _ = tx.send(reason);
        })
        .await
        .unwrap();

    assert!(manager.terminate(&context.session_id).await.unwrap());
    assert!(!manager.terminate(&context.session_id).await.unwrap());

    assert_eq!(recv(&mut rx).await, Some(RemovalReason::SignedOut));
    assert_eq!(recv(&mut rx).await, None);
}

#[tokio::test]
async fn monitoring_an_already_removed_session_fires_immediately() {
    let store = InMemorySessionStore::new();
    let manager = client(&store);
    let context = manager
        .create_session(principal("jdoe"), "jdoe@example.com")
        .await
        .unwrap();
    store
        .delete(&context.session_id, RemovalReason::SignedOut)
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _monitor = manager
        .monitor(context.session_id, move |reason| {
            let _ = tx.send(reason);
        })
        .await
        .unwrap();

    assert_eq!(recv(&mut rx).await, Some(RemovalReason::Vanished));
}

#[tokio::test]
async fn other_principals_are_untouched() {
    let store = InMemorySessionStore::new();
    let alice = client(&store)
        .create_session(principal("alice"), "alice@example.com")
        .await
        .unwrap();
    client(&store)
        .create_session(principal("bob"), "bob@example.com")
        .await
        .unwrap();

    assert!(store.get(&alice.session_id).await.unwrap().is_some());
    assert_eq!(store.len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sign_ins_leave_one_record() {
    let store = InMemorySessionStore::new();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                client(&store)
                    .create_session(principal("jdoe"), "jdoe@example.com")
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut created = Vec::new();
    for handle in handles {
        created.push(handle.await.unwrap().session_id);
    }

    let records = store.find_by_principal(&principal("jdoe")).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(created.contains(&records[0].session_id));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn sign_in_through_services_supersedes_other_client() {
    let store = InMemorySessionStore::new();
    let services = services(&store);
    let creds = services.credentials("jdoe", "pw").unwrap();

    let laptop = services.client();
    let laptop_session = laptop.sign_in(&creds).await.unwrap();
    assert_eq!(laptop_session.context.principal_email, "jdoe@example.com");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _monitor = laptop
        .sessions()
        .monitor(laptop_session.context.session_id, move |reason| {
            let _ = tx.send(reason);
        })
        .await
        .unwrap();

    let phone_session = services.client().sign_in(&creds).await.unwrap();

    assert_eq!(recv(&mut rx).await, Some(RemovalReason::Superseded));
    assert!(store
        .get(&phone_session.context.session_id)
        .await
        .unwrap()
        .is_some());
}
