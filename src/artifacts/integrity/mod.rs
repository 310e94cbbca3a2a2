//! Integrity tracking values
//!
//! Everything the integrity engine persists or reports: the per-asset state
//! machine, fingerprints, check results, corruption events and the health and
//! criticality scoring. The engine itself lives in `areas::integrity`.

pub mod alert;
pub mod check;
pub mod event;
pub mod fingerprint;
pub mod health;
pub mod record;
pub mod state;

use crate::artifacts::integrity::check::CheckResult;
use crate::artifacts::integrity::event::{CorruptionEvent, RecoveryMethod};
use crate::artifacts::integrity::state::IntegrityState;
use crate::errors::IntegrityError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Action a caller should take after a verification that did not end `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedFix {
    RestoreFromBackup,
    ManualReview,
}

impl SuggestedFix {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedFix::RestoreFromBackup => "restore from backup",
            SuggestedFix::ManualReview => "manual review",
        }
    }
}

/// Outcome of one `verify_integrity` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityCheckResult {
    pub path: String,
    /// State of the asset once verification (and any recovery) finished.
    pub status: IntegrityState,
    pub checks: Vec<CheckResult>,
    pub suggested_fix: Option<SuggestedFix>,
    pub event: Option<CorruptionEvent>,
    pub recovery: Option<RecoveryMethod>,
    /// Recovery strategies tried without success, in order.
    pub attempts: Vec<String>,
    pub health_score: f64,
}

impl IntegrityCheckResult {
    pub fn failed_checks(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.kind.as_str().to_string())
            .collect()
    }

    pub fn is_corrupted(&self) -> bool {
        self.checks.iter().any(|check| !check.passed)
    }

    /// `Ok` for intact or recovered assets, the matching error otherwise
    ///
    /// An asset left for a human stays an error even once its checks pass
    /// again, until someone resolves or restores it.
    pub fn into_result(self) -> Result<Self, IntegrityError> {
        let path = PathBuf::from(&self.path);
        match self.status {
            IntegrityState::Missing => Err(IntegrityError::Missing(path)),
            IntegrityState::ManualInterventionRequired | IntegrityState::Corrupted if !self.attempts.is_empty() => {
                Err(IntegrityError::RecoveryFailed {
                    path,
                    attempts: self.attempts,
                })
            }
            IntegrityState::ManualInterventionRequired | IntegrityState::Corrupted if self.is_corrupted() => {
                Err(IntegrityError::Corrupted {
                    failed_checks: self.failed_checks(),
                    path,
                })
            }
            IntegrityState::ManualInterventionRequired
            | IntegrityState::Corrupted
            | IntegrityState::Recovering => Err(IntegrityError::AwaitingIntervention(path)),
            IntegrityState::Valid => Ok(self),
        }
    }
}
