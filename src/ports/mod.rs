//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the gateway core and the outside world. Adapters implement these ports.
//!
//! - `RemoteTransport` - authenticated, timeout-bounded calls to the SCIM service
//! - `SessionStore` - shared session records with a principal index and
//!   per-record change subscriptions

mod remote_transport;
mod session_store;

pub use remote_transport::{
    Credentials, HttpMethod, RemoteTransport, TransportError, TransportRequest, TransportResponse,
};
pub use session_store::{SessionSignal, SessionStore, SessionStoreError, SessionWatch};
