use crate::artifacts::integrity::check::CheckKind;
use crate::artifacts::integrity::health::Criticality;
use crate::artifacts::objects::object_id::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of damage, named after the first check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionType {
    ContentMismatch,
    MetadataMismatch,
    DependencyMismatch,
    StructuralDamage,
    BlueprintStructure,
    BlueprintLogic,
}

impl CorruptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionType::ContentMismatch => "content_mismatch",
            CorruptionType::MetadataMismatch => "metadata_mismatch",
            CorruptionType::DependencyMismatch => "dependency_mismatch",
            CorruptionType::StructuralDamage => "structural_damage",
            CorruptionType::BlueprintStructure => "blueprint_structure",
            CorruptionType::BlueprintLogic => "blueprint_logic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Critical assets always escalate; otherwise the number of failed checks decides.
    pub fn classify(criticality: Criticality, failed_checks: usize) -> Self {
        if criticality == Criticality::Critical {
            Severity::Critical
        } else if failed_checks > 2 {
            Severity::High
        } else if failed_checks > 1 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn allows_auto_recovery(&self) -> bool {
        *self <= Severity::Medium
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMethod {
    RestoredFromBackup,
    RevertedToLastGood,
    StructuralRepair,
}

impl RecoveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryMethod::RestoredFromBackup => "restored_from_backup",
            RecoveryMethod::RevertedToLastGood => "reverted_to_last_good",
            RecoveryMethod::StructuralRepair => "structural_repair",
        }
    }
}

impl std::fmt::Display for RecoveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit entry written for every corrupted verification, recovered or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorruptionEvent {
    pub corruption_type: CorruptionType,
    pub severity: Severity,
    pub affected_paths: Vec<String>,
    pub detection_method: CheckKind,
    pub failed_checks: Vec<CheckKind>,
    pub detected_at: DateTime<Utc>,
    pub detected_by: String,
    pub auto_recovered: bool,
    pub recovery_method: Option<RecoveryMethod>,
    /// Set when the asset was left for a human: recovery was skipped or every strategy failed.
    #[serde(default)]
    pub requires_manual_intervention: bool,
    pub annotations: BTreeMap<String, String>,
}

impl CorruptionEvent {
    /// `None` when every check passed.
    pub fn detect(
        path: &str,
        failed_checks: Vec<CheckKind>,
        criticality: Criticality,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Option<Self> {
        let first = *failed_checks.first()?;

        Some(CorruptionEvent {
            corruption_type: first.corruption_type(),
            severity: Severity::classify(criticality, failed_checks.len()),
            affected_paths: vec![path.to_string()],
            detection_method: first,
            failed_checks,
            detected_at: at,
            detected_by: actor.to_string(),
            auto_recovered: false,
            recovery_method: None,
            requires_manual_intervention: false,
            annotations: BTreeMap::new(),
        })
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn mark_recovered(&mut self, method: RecoveryMethod) {
        self.auto_recovered = true;
        self.recovery_method = Some(method);
    }

    pub fn mark_manual_intervention(&mut self) {
        self.requires_manual_intervention = true;
    }
}

/// Snapshot of an asset's bytes kept in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupVersion {
    pub oid: ObjectId,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    /// Cleared once the stored object fails re-verification.
    pub healthy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Criticality::Low, 1, Severity::Low)]
    #[case(Criticality::High, 2, Severity::Medium)]
    #[case(Criticality::Medium, 3, Severity::High)]
    #[case(Criticality::Critical, 1, Severity::Critical)]
    fn severity_scales_with_failed_checks(
        #[case] criticality: Criticality,
        #[case] failed: usize,
        #[case] expected: Severity,
    ) {
        assert_eq!(Severity::classify(criticality, failed), expected);
    }

    #[test]
    fn events_persisted_before_the_manual_flag_still_load() {
        let mut event = CorruptionEvent::detect("a", vec![CheckKind::ContentHash], Criticality::Low, "ci", Utc::now()).unwrap();
        event.mark_manual_intervention();

        let mut json = serde_json::to_value(&event).unwrap();
        json.as_object_mut().unwrap().remove("requires_manual_intervention");
        let loaded = serde_json::from_value::<CorruptionEvent>(json).unwrap();

        assert!(!loaded.requires_manual_intervention);
        assert_eq!(loaded.corruption_type, CorruptionType::ContentMismatch);
    }

    #[test]
    fn event_type_follows_first_failure() {
        let event = CorruptionEvent::detect(
            "Content/Hero.uasset",
            vec![CheckKind::MetadataHash, CheckKind::Structure],
            Criticality::Low,
            "ci",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(event.corruption_type, CorruptionType::MetadataMismatch);
        assert_eq!(event.severity, Severity::Medium);
        assert!(!event.auto_recovered);
        assert!(!event.requires_manual_intervention);
        assert!(CorruptionEvent::detect("a", vec![], Criticality::Critical, "ci", Utc::now()).is_none());
    }
}
