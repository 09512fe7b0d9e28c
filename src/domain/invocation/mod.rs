//! Workflow invocation domain types.

mod envelope;
mod request;
mod result;

pub use envelope::{InvocationBody, InvocationEnvelope, DEFAULT_INVOCATION_SCHEMA};
pub use request::{InvocationRequest, Parameters};
pub use result::{InvocationResult, CASE_ID_FIELD, COMPLETION_STATUS_FIELD};
