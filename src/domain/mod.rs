//! Domain layer - gateway vocabulary with no I/O.

pub mod attributes;
pub mod foundation;
pub mod identity;
pub mod invocation;
pub mod session;
