//! Identity resolution domain: resolved profiles and failure classification.

mod failure;
mod profile;

pub use failure::{classify, FailureKind, ResolveError, StrategyFailure};
pub use profile::ResolvedProfile;
