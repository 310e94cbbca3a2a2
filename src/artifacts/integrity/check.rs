use crate::artifacts::analyzer::AssetAnalysis;
use crate::artifacts::integrity::event::CorruptionType;
use crate::artifacts::integrity::fingerprint::Fingerprint;
use crate::artifacts::integrity::record::IntegrityRecord;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Verification checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ContentHash,
    MetadataHash,
    DependencyList,
    Structure,
    BlueprintStructure,
    BlueprintLogic,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::ContentHash => "content_hash",
            CheckKind::MetadataHash => "metadata_hash",
            CheckKind::DependencyList => "dependency_list",
            CheckKind::Structure => "structure",
            CheckKind::BlueprintStructure => "blueprint_structure",
            CheckKind::BlueprintLogic => "blueprint_logic",
        }
    }

    pub fn corruption_type(&self) -> CorruptionType {
        match self {
            CheckKind::ContentHash => CorruptionType::ContentMismatch,
            CheckKind::MetadataHash => CorruptionType::MetadataMismatch,
            CheckKind::DependencyList => CorruptionType::DependencyMismatch,
            CheckKind::Structure => CorruptionType::StructuralDamage,
            CheckKind::BlueprintStructure => CorruptionType::BlueprintStructure,
            CheckKind::BlueprintLogic => CorruptionType::BlueprintLogic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Compare the current content of an asset against its record.
pub fn run_checks(record: &IntegrityRecord, current: &Fingerprint, analysis: &AssetAnalysis) -> Vec<CheckResult> {
    let baseline = &record.fingerprint;
    let compare = |kind: CheckKind, expected: &dyn std::fmt::Display, actual: &dyn std::fmt::Display| {
        let (expected, actual) = (expected.to_string(), actual.to_string());
        let passed = expected == actual;
        let detail = (!passed).then(|| format!("expected {expected}, found {actual}"));
        CheckResult::new(kind, passed, detail)
    };

    let mut checks = vec![
        compare(CheckKind::ContentHash, &baseline.content_digest, &current.content_digest),
        compare(CheckKind::MetadataHash, &baseline.metadata_hash, &current.metadata_hash),
        compare(CheckKind::DependencyList, &baseline.dependency_hash, &current.dependency_hash),
    ];

    let structure_ok = !baseline.structured || current.structured;
    checks.push(CheckResult::new(
        CheckKind::Structure,
        structure_ok,
        analysis.error.as_ref().filter(|_| !structure_ok).map(ToString::to_string),
    ));

    if record.is_blueprint {
        let info = &analysis.info;
        let subtype_ok = info.is_blueprint && info.blueprint_subtype == record.blueprint_subtype;
        checks.push(CheckResult::new(
            CheckKind::BlueprintStructure,
            subtype_ok,
            (!subtype_ok).then(|| "blueprint markers or subtype changed".to_string()),
        ));

        let logic_ok = current.blueprint_logic_hash == baseline.blueprint_logic_hash;
        checks.push(CheckResult::new(
            CheckKind::BlueprintLogic,
            logic_ok,
            (!logic_ok).then(|| "blueprint name table changed".to_string()),
        ));
    }

    checks
}
