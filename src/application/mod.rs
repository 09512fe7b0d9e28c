//! Application layer - Services that orchestrate domain operations over ports.
//!
//! - `WorkflowGateway` - remote workflow invocations
//! - `ProfileResolver` - concurrent identity resolution
//! - `SessionExclusivityManager` - single active session per principal
//! - `SignInService` - sign-in/sign-out composition of the above

pub mod profile_resolver;
pub mod session_manager;
pub mod sign_in;
pub mod workflow_gateway;

pub use profile_resolver::{
    ProfileResolver, ProfileStrategy, SearchByIdentifierStrategy, SelfLookupStrategy,
};
pub use session_manager::{AuthAttempt, SessionExclusivityManager, SessionMonitor};
pub use sign_in::{AuthenticatedSession, SignInService};
pub use workflow_gateway::{InvocationError, WorkflowGateway};
