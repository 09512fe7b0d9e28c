//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the gateway.

mod errors;
mod ids;
mod session_phase;
mod state_machine;
mod timestamp;

pub use errors::{ErrorKind, GatewayError, ValidationError};
pub use ids::{CaseId, PrincipalId, SessionId};
pub use session_phase::SessionPhase;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
