//! Session exclusivity domain types.

mod errors;
mod record;

pub use errors::SessionError;
pub use record::{RemovalReason, SessionContext, SessionRecord};
