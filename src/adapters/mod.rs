//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the gateway to external systems:
//! - `scim` - Remote transport implementations (reqwest, mock)
//! - `session_store` - Session store implementations (Redis, in-memory)

pub mod scim;
pub mod session_store;

pub use scim::{MockReply, MockTransport, ScimHttpConfig, ScimHttpTransport, SCIM_MEDIA_TYPE};
pub use session_store::{InMemorySessionStore, RedisSessionStore, RedisSessionStoreConfig};
