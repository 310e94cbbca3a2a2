use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked asset
///
/// ```text
/// Valid ──> Corrupted ──> Recovering ──> Valid
///             │               └───────> Corrupted
///             └──> ManualInterventionRequired ──> Valid | Recovering
/// any ──> Missing ──> Valid | Corrupted | Recovering
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityState {
    Valid,
    Corrupted,
    Recovering,
    ManualInterventionRequired,
    Missing,
}

impl IntegrityState {
    pub fn can_transition_to(self, to: IntegrityState) -> bool {
        use IntegrityState::*;

        match (self, to) {
            (_, Missing) => true,
            (Valid, Valid | Corrupted) => true,
            (Corrupted, Recovering | ManualInterventionRequired) => true,
            (Recovering, Valid | Corrupted) => true,
            // only a human leaves this state
            (ManualInterventionRequired, Valid | Recovering) => true,
            (Missing, Valid | Corrupted | Recovering) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityState::Valid => "valid",
            IntegrityState::Corrupted => "corrupted",
            IntegrityState::Recovering => "recovering",
            IntegrityState::ManualInterventionRequired => "manual_intervention_required",
            IntegrityState::Missing => "missing",
        }
    }
}

impl std::fmt::Display for IntegrityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a record's append-only state history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: IntegrityState,
    pub to: IntegrityState,
    pub at: DateTime<Utc>,
    pub actor: String,
}

#[cfg(test)]
mod tests {
    use super::IntegrityState::*;
    use rstest::rstest;

    #[rstest]
    #[case(Valid, Corrupted, true)]
    #[case(Valid, Recovering, false)]
    #[case(Valid, ManualInterventionRequired, false)]
    #[case(Corrupted, Valid, false)]
    #[case(Corrupted, Recovering, true)]
    #[case(Recovering, Valid, true)]
    #[case(Recovering, ManualInterventionRequired, false)]
    #[case(ManualInterventionRequired, Corrupted, false)]
    #[case(ManualInterventionRequired, Valid, true)]
    #[case(Recovering, Missing, true)]
    #[case(Missing, Valid, true)]
    fn transitions(#[case] from: super::IntegrityState, #[case] to: super::IntegrityState, #[case] allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }
}
