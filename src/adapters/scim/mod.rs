//! SCIM transport adapters.
//!
//! Implementations of the `RemoteTransport` port:
//!
//! - `http_transport` - Production reqwest implementation
//! - `mock_transport` - Scripted implementation for tests

mod http_transport;
mod mock_transport;

pub use http_transport::{ScimHttpConfig, ScimHttpTransport, SCIM_MEDIA_TYPE};
pub use mock_transport::{MockReply, MockTransport};
