//! Session store adapters.
//!
//! - `RedisSessionStore` - production, shared across processes
//! - `InMemorySessionStore` - tests and single-process deployments

mod in_memory;
mod redis;

pub use in_memory::InMemorySessionStore;
pub use redis::{RedisSessionStore, RedisSessionStoreConfig};
