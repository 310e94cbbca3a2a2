use crate::artifacts::analyzer::AssetAnalysis;
use crate::artifacts::analyzer::asset_type::AssetType;
use crate::artifacts::analyzer::blueprint::BlueprintSubtype;
use crate::artifacts::integrity::event::{BackupVersion, CorruptionEvent};
use crate::artifacts::integrity::fingerprint::Fingerprint;
use crate::artifacts::integrity::health::{Criticality, IntegrityPolicy};
use crate::artifacts::integrity::state::{IntegrityState, StateTransition};
use crate::errors::IntegrityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the engine knows about one tracked asset
///
/// Events, transitions and backups are append-only; re-tracking replaces the
/// fingerprint and the analysis fields but keeps the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    pub path: String,
    pub state: IntegrityState,
    pub fingerprint: Fingerprint,
    pub asset_type: AssetType,
    pub is_blueprint: bool,
    pub blueprint_subtype: Option<BlueprintSubtype>,
    pub dependency_count: usize,
    pub criticality: Criticality,
    pub health_score: f64,
    pub tracked_at: DateTime<Utc>,
    pub last_verified: Option<DateTime<Utc>>,
    pub backups: Vec<BackupVersion>,
    pub events: Vec<CorruptionEvent>,
    pub transitions: Vec<StateTransition>,
}

impl IntegrityRecord {
    pub fn new(
        path: impl Into<String>,
        bytes: &[u8],
        analysis: &AssetAnalysis,
        policy: &IntegrityPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let mut record = IntegrityRecord {
            path: path.into(),
            state: IntegrityState::Valid,
            fingerprint: Fingerprint::compute(bytes, analysis),
            asset_type: analysis.info.asset_type,
            is_blueprint: false,
            blueprint_subtype: None,
            dependency_count: 0,
            criticality: Criticality::Low,
            health_score: policy.max_health,
            tracked_at: now,
            last_verified: None,
            backups: Vec::new(),
            events: Vec::new(),
            transitions: Vec::new(),
        };
        record.rebaseline(bytes, analysis, policy, now);
        record
    }

    /// Take the current content as the new known-good baseline.
    pub fn rebaseline(&mut self, bytes: &[u8], analysis: &AssetAnalysis, policy: &IntegrityPolicy, now: DateTime<Utc>) {
        let info = &analysis.info;

        self.fingerprint = Fingerprint::compute(bytes, analysis);
        self.asset_type = info.asset_type;
        self.is_blueprint = info.is_blueprint;
        self.blueprint_subtype = info.blueprint_subtype;
        self.dependency_count = info.dependencies.len();
        self.criticality = policy.criticality(info);
        self.tracked_at = now;
        self.refresh_health(policy, now);
    }

    pub fn refresh_health(&mut self, policy: &IntegrityPolicy, now: DateTime<Utc>) {
        self.health_score = policy.health_score(&self.events, self.is_blueprint, self.dependency_count, now);
    }

    /// Move to `to`, rejecting transitions the state machine forbids.
    pub fn transition(&mut self, to: IntegrityState, actor: &str, at: DateTime<Utc>) -> Result<(), IntegrityError> {
        if !self.state.can_transition_to(to) {
            return Err(IntegrityError::InvalidTransition {
                path: PathBuf::from(&self.path),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }

        self.transitions.push(StateTransition {
            from: self.state,
            to,
            at,
            actor: actor.to_string(),
        });
        self.state = to;
        Ok(())
    }

    /// Record a backup unless it duplicates the newest one.
    pub fn push_backup(&mut self, backup: BackupVersion) {
        if self
            .backups
            .last()
            .is_some_and(|latest| latest.oid == backup.oid && latest.healthy == backup.healthy)
        {
            return;
        }
        self.backups.push(backup);
    }

    /// Indices of healthy backups, newest first.
    pub fn healthy_backups(&self) -> Vec<usize> {
        let mut indices = (0..self.backups.len())
            .filter(|&i| self.backups[i].healthy)
            .collect::<Vec<_>>();
        indices.sort_by_key(|&i| std::cmp::Reverse((self.backups[i].created_at, i)));
        indices
    }
}
