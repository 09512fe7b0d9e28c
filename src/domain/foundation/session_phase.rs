//! Client-side session lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle phase of the session held by one client process.
///
/// ```text
/// Unauthenticated -> Authenticating -> Active -> Unauthenticated
///                          |                          ^
///                          +------- (failure) --------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Unauthenticated,
    Authenticating,
    Active,
}

impl StateMachine for SessionPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Unauthenticated, Authenticating)
                | (Authenticating, Active)
                | (Authenticating, Unauthenticated)
                | (Active, Unauthenticated)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionPhase::*;
        match self {
            Unauthenticated => vec![Authenticating],
            Authenticating => vec![Active, Unauthenticated],
            Active => vec![Unauthenticated],
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Unauthenticated => "Unauthenticated",
            SessionPhase::Authenticating => "Authenticating",
            SessionPhase::Active => "Active",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unauthenticated() {
        assert_eq!(SessionPhase::default(), SessionPhase::Unauthenticated);
    }

    #[test]
    fn sign_in_path_is_valid() {
        let phase = SessionPhase::Unauthenticated
            .transition_to(SessionPhase::Authenticating)
            .and_then(|p| p.transition_to(SessionPhase::Active))
            .and_then(|p| p.transition_to(SessionPhase::Unauthenticated));
        assert_eq!(phase, Ok(SessionPhase::Unauthenticated));
    }

    #[test]
    fn failed_authentication_returns_to_unauthenticated() {
        assert!(SessionPhase::Authenticating.can_transition_to(&SessionPhase::Unauthenticated));
    }

    #[test]
    fn cannot_skip_authenticating() {
        assert!(SessionPhase::Unauthenticated
            .transition_to(SessionPhase::Active)
            .is_err());
    }

    #[test]
    fn active_cannot_reauthenticate_without_sign_out() {
        assert!(!SessionPhase::Active.can_transition_to(&SessionPhase::Authenticating));
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        use SessionPhase::*;
        for from in [Unauthenticated, Authenticating, Active] {
            for to in [Unauthenticated, Authenticating, Active] {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to)
                );
            }
        }
    }
}
