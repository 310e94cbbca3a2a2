//! Integrity & recovery engine
//!
//! Tracks assets of the working copy against a fingerprint baseline, detects
//! corruption and runs the automated recovery ladder:
//!
//! 1. newest healthy backup from the object store
//! 2. newest verified version of the path in the branch history
//! 3. structural repair (blueprints only)
//!
//! Only `Low` and `Medium` severity corruption is recovered automatically. An
//! asset whose recovery failed waits in `ManualInterventionRequired` until
//! [`IntegrityEngine::resolve_manual_intervention`] or a manual
//! [`IntegrityEngine::restore_from_backup`].
//!
//! Verification of one path is serialised by a per-path async mutex; distinct
//! paths verify concurrently.

use crate::areas::commit_graph::CommitGraph;
use crate::areas::database::Database;
use crate::areas::integrity_records::IntegrityRecords;
use crate::areas::workspace::Workspace;
use crate::artifacts::analyzer::package_header::PACKAGE_MAGIC;
use crate::artifacts::analyzer::analyze_or_scan;
use crate::artifacts::analyzer::dependency::display_path;
use crate::artifacts::branch::branch_name::{BranchName, ProjectId};
use crate::artifacts::database::object_metadata::ObjectMetadata;
use crate::artifacts::integrity::alert::AlertSink;
use crate::artifacts::integrity::check::run_checks;
use crate::artifacts::integrity::event::{BackupVersion, CorruptionEvent, RecoveryMethod};
use crate::artifacts::integrity::fingerprint::Fingerprint;
use crate::artifacts::integrity::health::IntegrityPolicy;
use crate::artifacts::integrity::record::IntegrityRecord;
use crate::artifacts::integrity::state::IntegrityState;
use crate::artifacts::integrity::{IntegrityCheckResult, SuggestedFix};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::IntegrityError;
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use derive_new::new;
use futures::future::join_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Branch whose history serves as the last-known-good source.
#[derive(Debug, Clone, new)]
pub struct HistorySource {
    graph: Arc<CommitGraph>,
    project: ProjectId,
    branch: BranchName,
    depth: usize,
}

#[derive(Debug)]
pub struct IntegrityEngine {
    database: Arc<Database>,
    workspace: Arc<Workspace>,
    records: IntegrityRecords,
    alerts: Arc<dyn AlertSink>,
    policy: IntegrityPolicy,
    history: Option<HistorySource>,
    path_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl IntegrityEngine {
    pub fn new(
        database: Arc<Database>,
        workspace: Arc<Workspace>,
        records: IntegrityRecords,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        IntegrityEngine {
            database,
            workspace,
            records,
            alerts,
            policy: IntegrityPolicy::default(),
            history: None,
            path_locks: DashMap::new(),
        }
    }

    pub fn with_policy(mut self, policy: IntegrityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_history(mut self, history: HistorySource) -> Self {
        self.history = Some(history);
        self
    }

    pub fn policy(&self) -> &IntegrityPolicy {
        &self.policy
    }

    fn path_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.path_locks.entry(key.to_string()).or_default().clone()
    }

    /// Start tracking `path`, or re-baseline it when it is already tracked.
    pub async fn track_asset(&self, path: &Path, actor: &str) -> Result<IntegrityRecord, IntegrityError> {
        let path = &self.asset_path(path)?;
        let key = display_path(path);
        let lock = self.path_lock(&key);
        let _guard = lock.lock().await;

        let bytes = self.read_asset(path)?;
        let analysis = analyze_or_scan(path, &bytes);
        let now = Utc::now();

        let mut record = match self.records.load(&key)? {
            Some(mut record) => {
                match record.state {
                    IntegrityState::Valid => {}
                    IntegrityState::Missing => record.transition(IntegrityState::Valid, actor, now)?,
                    state => {
                        return Err(IntegrityError::InvalidTransition {
                            path: path.to_path_buf(),
                            from: state.to_string(),
                            to: IntegrityState::Valid.to_string(),
                        });
                    }
                }
                record.rebaseline(&bytes, &analysis, &self.policy, now);
                record
            }
            None => IntegrityRecord::new(key.clone(), &bytes, &analysis, &self.policy, now),
        };

        let backup = self.store_backup(&key, bytes)?;
        record.push_backup(backup);
        self.records.save(&record)?;

        info!(
            path = %key,
            asset_type = %record.asset_type,
            criticality = %record.criticality,
            health = record.health_score,
            "tracking asset"
        );
        Ok(record)
    }

    /// Run the check battery on `path`, recovering automatically where allowed.
    pub async fn verify_integrity(&self, path: &Path, actor: &str) -> Result<IntegrityCheckResult, IntegrityError> {
        let path = &self.asset_path(path)?;
        let key = display_path(path);
        let lock = self.path_lock(&key);
        let _guard = lock.lock().await;

        let mut record = self.require_record(path, &key)?;
        let now = Utc::now();
        record.last_verified = Some(now);

        let bytes = match self.workspace.read_file(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if record.state != IntegrityState::Missing {
                    record.transition(IntegrityState::Missing, actor, now)?;
                }
                record.refresh_health(&self.policy, now);
                self.records.save(&record)?;
                warn!(path = %key, "tracked asset is missing");

                return Ok(IntegrityCheckResult {
                    path: key,
                    status: IntegrityState::Missing,
                    checks: Vec::new(),
                    suggested_fix: Some(SuggestedFix::RestoreFromBackup),
                    event: None,
                    recovery: None,
                    attempts: Vec::new(),
                    health_score: record.health_score,
                });
            }
            Err(e) => return Err(IntegrityError::io(self.workspace.absolute(path))(e)),
        };

        let analysis = analyze_or_scan(path, &bytes);
        let current = Fingerprint::compute(&bytes, &analysis);
        let checks = run_checks(&record, &current, &analysis);
        let failed = checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.kind)
            .collect::<Vec<_>>();

        let Some(mut event) = CorruptionEvent::detect(&key, failed, record.criticality, actor, now) else {
            if record.state == IntegrityState::Missing {
                record.transition(IntegrityState::Valid, actor, now)?;
            }
            record.refresh_health(&self.policy, now);
            self.records.save(&record)?;
            debug!(path = %key, state = %record.state, "asset verified");

            let suggested_fix = (record.state == IntegrityState::ManualInterventionRequired)
                .then_some(SuggestedFix::ManualReview);
            return Ok(IntegrityCheckResult {
                path: key,
                status: record.state,
                checks,
                suggested_fix,
                event: None,
                recovery: None,
                attempts: Vec::new(),
                health_score: record.health_score,
            });
        };

        event.annotate("asset_type", record.asset_type.as_str());
        event.annotate("criticality", record.criticality.as_str());
        warn!(
            path = %key,
            corruption = event.corruption_type.as_str(),
            severity = event.severity.as_str(),
            failed = ?event.failed_checks,
            "corruption detected"
        );

        let mut attempts = Vec::new();
        let response = self.respond_to_corruption(&mut record, &mut event, path, &bytes, actor, &mut attempts);
        if record.state == IntegrityState::ManualInterventionRequired {
            event.mark_manual_intervention();
        }

        // the event is recorded even when the response stopped half way
        self.alerts.send(&event);
        record.events.push(event.clone());
        record.refresh_health(&self.policy, now);
        self.records.save(&record)?;
        let recovery = response?;

        let suggested_fix = (record.state == IntegrityState::ManualInterventionRequired).then(|| {
            if record.healthy_backups().is_empty() {
                SuggestedFix::ManualReview
            } else {
                SuggestedFix::RestoreFromBackup
            }
        });

        Ok(IntegrityCheckResult {
            path: key,
            status: record.state,
            checks,
            suggested_fix,
            event: Some(event),
            recovery,
            attempts,
            health_score: record.health_score,
        })
    }

    /// Move a corrupted record through recovery; ends in `Valid` or `ManualInterventionRequired`.
    fn respond_to_corruption(
        &self,
        record: &mut IntegrityRecord,
        event: &mut CorruptionEvent,
        path: &Path,
        bytes: &[u8],
        actor: &str,
        attempts: &mut Vec<String>,
    ) -> Result<Option<RecoveryMethod>, IntegrityError> {
        let now = event.detected_at;
        if record.state == IntegrityState::ManualInterventionRequired {
            return Ok(None);
        }

        record.transition(IntegrityState::Corrupted, actor, now)?;
        if !event.severity.allows_auto_recovery() {
            record.transition(IntegrityState::ManualInterventionRequired, actor, now)?;
            return Ok(None);
        }

        record.transition(IntegrityState::Recovering, actor, now)?;
        if let Some((method, restored)) = self.attempt_recovery(record, bytes, attempts) {
            match self.apply_restore(record, path, restored, actor) {
                Ok(()) => {
                    event.mark_recovered(method);
                    info!(path = %record.path, method = method.as_str(), "asset recovered");
                    return Ok(Some(method));
                }
                Err(e) => {
                    warn!(path = %record.path, method = method.as_str(), error = %e, "recovered content could not be written back");
                    attempts.push(method.to_string());
                }
            }
        }

        record.transition(IntegrityState::Corrupted, actor, now)?;
        record.transition(IntegrityState::ManualInterventionRequired, actor, now)?;
        event.annotate("recovery_attempts", attempts.join(","));
        Ok(None)
    }

    /// Verify several paths concurrently.
    pub async fn verify_many(
        &self,
        paths: &[PathBuf],
        actor: &str,
    ) -> Vec<(PathBuf, Result<IntegrityCheckResult, IntegrityError>)> {
        join_all(paths.iter().map(|path| async move {
            let result = self.verify_integrity(path, actor).await;
            (path.clone(), result)
        }))
        .await
    }

    /// Snapshot the current content of a tracked asset.
    ///
    /// The backup is flagged healthy only when the content still matches the
    /// recorded baseline.
    pub async fn create_backup(&self, path: &Path) -> Result<BackupVersion, IntegrityError> {
        let path = &self.asset_path(path)?;
        let key = display_path(path);
        let lock = self.path_lock(&key);
        let _guard = lock.lock().await;

        let mut record = self.require_record(path, &key)?;
        let bytes = self.read_asset(path)?;
        let healthy = ObjectId::digest(&bytes) == record.fingerprint.content_digest;

        let mut backup = self.store_backup(&key, bytes)?;
        backup.healthy = healthy;
        record.push_backup(backup.clone());
        self.records.save(&record)?;

        debug!(path = %key, oid = %backup.oid, healthy, "backup created");
        Ok(backup)
    }

    /// Manually restore the newest healthy backup.
    pub async fn restore_from_backup(&self, path: &Path, actor: &str) -> Result<IntegrityRecord, IntegrityError> {
        let path = &self.asset_path(path)?;
        let key = display_path(path);
        let lock = self.path_lock(&key);
        let _guard = lock.lock().await;

        let mut record = self.require_record(path, &key)?;
        let now = Utc::now();
        record.transition(IntegrityState::Recovering, actor, now)?;

        let failure = match self.restore_latest_backup(&mut record) {
            Some(restored) => match self.apply_restore(&mut record, path, restored, actor) {
                Ok(()) => {
                    self.records.save(&record)?;
                    info!(path = %key, actor, "asset restored from backup");
                    return Ok(record);
                }
                Err(e) => e,
            },
            None => IntegrityError::RecoveryFailed {
                path: path.to_path_buf(),
                attempts: vec![RecoveryMethod::RestoredFromBackup.to_string()],
            },
        };

        record.transition(IntegrityState::Corrupted, actor, now)?;
        record.transition(IntegrityState::ManualInterventionRequired, actor, now)?;
        self.records.save(&record)?;
        Err(failure)
    }

    /// Accept the current content of an asset awaiting a human decision.
    pub async fn resolve_manual_intervention(
        &self,
        path: &Path,
        actor: &str,
    ) -> Result<IntegrityRecord, IntegrityError> {
        let path = &self.asset_path(path)?;
        let key = display_path(path);
        let lock = self.path_lock(&key);
        let _guard = lock.lock().await;

        let mut record = self.require_record(path, &key)?;
        if record.state != IntegrityState::ManualInterventionRequired {
            return Err(IntegrityError::InvalidTransition {
                path: path.to_path_buf(),
                from: record.state.to_string(),
                to: IntegrityState::Valid.to_string(),
            });
        }

        let bytes = self.read_asset(path)?;
        let analysis = analyze_or_scan(path, &bytes);
        let now = Utc::now();

        record.transition(IntegrityState::Valid, actor, now)?;
        record.rebaseline(&bytes, &analysis, &self.policy, now);
        let backup = self.store_backup(&key, bytes)?;
        record.push_backup(backup);
        self.records.save(&record)?;

        info!(path = %key, actor, "manual intervention resolved");
        Ok(record)
    }

    pub fn record(&self, path: &Path) -> Result<Option<IntegrityRecord>, IntegrityError> {
        self.records.load(&display_path(&self.asset_path(path)?))
    }

    pub fn tracked_paths(&self) -> Result<Vec<String>, IntegrityError> {
        Ok(self
            .records
            .list()?
            .into_iter()
            .map(|record| record.path)
            .collect())
    }

    /// Backup digests that garbage collection must keep.
    pub fn backup_roots(&self) -> Result<HashSet<ObjectId>, IntegrityError> {
        Ok(self
            .records
            .list()?
            .into_iter()
            .flat_map(|record| record.backups.into_iter().map(|backup| backup.oid))
            .collect())
    }

    /// Workspace-relative form of a caller-supplied asset path.
    fn asset_path(&self, path: &Path) -> Result<PathBuf, IntegrityError> {
        self.workspace
            .normalize(path)
            .ok_or_else(|| IntegrityError::OutsideWorkspace(path.to_path_buf()))
    }

    fn require_record(&self, path: &Path, key: &str) -> Result<IntegrityRecord, IntegrityError> {
        self.records
            .load(key)?
            .ok_or_else(|| IntegrityError::NotTracked(path.to_path_buf()))
    }

    fn read_asset(&self, path: &Path) -> Result<Bytes, IntegrityError> {
        self.workspace.read_file(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IntegrityError::Missing(path.to_path_buf())
            } else {
                IntegrityError::io(self.workspace.absolute(path))(e)
            }
        })
    }

    fn store_backup(&self, key: &str, bytes: Bytes) -> Result<BackupVersion, IntegrityError> {
        let outcome = self.database.put(bytes, &ObjectMetadata::for_path(key))?;
        Ok(BackupVersion {
            oid: outcome.oid,
            size: outcome.size,
            created_at: Utc::now(),
            healthy: true,
        })
    }

    /// Write recovered bytes back and take them as the new baseline.
    fn apply_restore(
        &self,
        record: &mut IntegrityRecord,
        path: &Path,
        restored: Bytes,
        actor: &str,
    ) -> Result<(), IntegrityError> {
        self.workspace
            .write_file(path, &restored)
            .map_err(IntegrityError::io(self.workspace.absolute(path)))?;

        let analysis = analyze_or_scan(path, &restored);
        let now = Utc::now();
        record.rebaseline(&restored, &analysis, &self.policy, now);
        record.transition(IntegrityState::Valid, actor, now)
    }

    fn attempt_recovery(
        &self,
        record: &mut IntegrityRecord,
        current: &[u8],
        attempts: &mut Vec<String>,
    ) -> Option<(RecoveryMethod, Bytes)> {
        if let Some(bytes) = self.restore_latest_backup(record) {
            return Some((RecoveryMethod::RestoredFromBackup, bytes));
        }
        attempts.push(RecoveryMethod::RestoredFromBackup.to_string());

        if let Some(bytes) = self.revert_to_last_good(&record.path) {
            return Some((RecoveryMethod::RevertedToLastGood, bytes));
        }
        attempts.push(RecoveryMethod::RevertedToLastGood.to_string());

        if record.is_blueprint {
            if let Some(bytes) = structural_repair(current, &record.fingerprint) {
                return Some((RecoveryMethod::StructuralRepair, bytes));
            }
            attempts.push(RecoveryMethod::StructuralRepair.to_string());
        }

        None
    }

    /// Newest healthy backup whose object still verifies; failing backups are flagged unhealthy.
    fn restore_latest_backup(&self, record: &mut IntegrityRecord) -> Option<Bytes> {
        for index in record.healthy_backups() {
            let oid = record.backups[index].oid.clone();
            let verified = self.database.verify_object(&oid).unwrap_or(false);

            if verified && let Ok((bytes, _)) = self.database.get(&oid) {
                return Some(bytes);
            }

            warn!(path = %record.path, oid = %oid, "backup failed verification");
            record.backups[index].healthy = false;
        }
        None
    }

    fn revert_to_last_good(&self, key: &str) -> Option<Bytes> {
        let history = self.history.as_ref()?;
        let versions = history
            .graph
            .find_file_versions(&history.project, &history.branch, key, history.depth)
            .inspect_err(|e| debug!(path = %key, error = %e, "history unavailable for revert"))
            .ok()?;

        versions.into_iter().find_map(|version| {
            let oid = version.entry.oid;
            if !self.database.verify_object(&oid).unwrap_or(false) {
                return None;
            }
            self.database.get(&oid).ok().map(|(bytes, _)| bytes)
        })
    }
}

/// Restore the package magic and drop trailing bytes; only an exact match counts.
fn structural_repair(current: &[u8], baseline: &Fingerprint) -> Option<Bytes> {
    let size = usize::try_from(baseline.size).ok()?;
    if current.len() < size || size < 4 {
        return None;
    }

    let mut repaired = current[..size].to_vec();
    LittleEndian::write_u32(&mut repaired[..4], PACKAGE_MAGIC);

    (ObjectId::digest(&repaired) == baseline.content_digest).then(|| Bytes::from(repaired))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::refs::Refs;
    use crate::artifacts::analyzer::fixture::PackageFixture;
    use crate::areas::commit_graph::CommitRequest;
    use crate::artifacts::integrity::alert::MemoryAlertSink;
    use crate::artifacts::integrity::check::CheckKind;
    use crate::artifacts::integrity::event::Severity;
    use crate::artifacts::integrity::health::Criticality;
    use crate::artifacts::objects::commit::Author;
    use crate::artifacts::objects::entry_mode::{EntryKind, EntryMode};
    use crate::artifacts::objects::tree::TreeEntry;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;

    struct Harness {
        dir: TempDir,
        database: Arc<Database>,
        alerts: Arc<MemoryAlertSink>,
        engine: IntegrityEngine,
    }

    fn harness() -> Harness {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let database = Arc::new(Database::new(
            root.join(".hoard/objects").into_boxed_path(),
            root.join(".hoard/uploads").into_boxed_path(),
        ));
        let workspace = Arc::new(Workspace::new(root.clone().into_boxed_path()));
        let alerts = Arc::new(MemoryAlertSink::default());
        let engine = IntegrityEngine::new(
            database.clone(),
            workspace,
            IntegrityRecords::new(root.join(".hoard/integrity").into_boxed_path()),
            alerts.clone(),
        );

        Harness {
            dir,
            database,
            alerts,
            engine,
        }
    }

    fn mesh() -> Vec<u8> {
        PackageFixture::default()
            .with_names(["StaticMesh", "/Game/Props/SM_Rock"])
            .with_trailer(b"vertex buffer")
            .build()
    }

    fn blueprint() -> Vec<u8> {
        PackageFixture::default()
            .with_names(["BlueprintGeneratedClass", "BP_Door_C", "Actor"])
            .build()
    }

    fn flip_last_byte(bytes: &[u8]) -> Vec<u8> {
        let mut damaged = bytes.to_vec();
        if let Some(last) = damaged.last_mut() {
            *last ^= 0xff;
        }
        damaged
    }

    const ROCK: &str = "Content/Props/SM_Rock.uasset";

    #[tokio::test]
    async fn content_change_is_detected_and_restored_from_backup() {
        let h = harness();
        let original = mesh();
        h.dir.child(ROCK).write_binary(&original).unwrap();
        h.engine.track_asset(Path::new(ROCK), "artist").await.unwrap();

        h.dir.child(ROCK).write_binary(&flip_last_byte(&original)).unwrap();
        let result = h.engine.verify_integrity(Path::new(ROCK), "ci").await.unwrap();

        assert_eq!(result.checks[0].kind, CheckKind::ContentHash);
        assert!(!result.checks[0].passed);
        assert_eq!(result.recovery, Some(RecoveryMethod::RestoredFromBackup));
        assert_eq!(result.status, IntegrityState::Valid);
        assert_eq!(std::fs::read(h.dir.child(ROCK).path()).unwrap(), original);

        let event = result.event.unwrap();
        assert!(event.auto_recovered);
        assert_eq!(event.severity, Severity::Low);
        assert_eq!(h.alerts.events().len(), 1);

        let record = h.engine.record(Path::new(ROCK)).unwrap().unwrap();
        assert_eq!(record.events.len(), 1);
        assert_eq!(record.health_score, 80.0);
    }

    #[tokio::test]
    async fn missing_file_is_not_corruption() {
        let h = harness();
        h.dir.child(ROCK).write_binary(&mesh()).unwrap();
        h.engine.track_asset(Path::new(ROCK), "artist").await.unwrap();

        std::fs::remove_file(h.dir.child(ROCK).path()).unwrap();
        let result = h.engine.verify_integrity(Path::new(ROCK), "ci").await.unwrap();

        assert_eq!(result.status, IntegrityState::Missing);
        assert_eq!(result.suggested_fix, Some(SuggestedFix::RestoreFromBackup));
        assert!(result.event.is_none());
        assert!(h.alerts.events().is_empty());
        assert!(matches!(result.into_result(), Err(IntegrityError::Missing(_))));

        let restored = h.engine.restore_from_backup(Path::new(ROCK), "artist").await.unwrap();
        assert_eq!(restored.state, IntegrityState::Valid);
        assert_eq!(std::fs::read(h.dir.child(ROCK).path()).unwrap(), mesh());
    }

    #[tokio::test]
    async fn unrecoverable_asset_requires_manual_intervention() {
        let h = harness();
        let original = mesh();
        h.dir.child(ROCK).write_binary(&original).unwrap();
        let record = h.engine.track_asset(Path::new(ROCK), "artist").await.unwrap();
        std::fs::remove_file(h.database.objects_path().join(record.backups[0].oid.to_path())).unwrap();

        h.dir.child(ROCK).write_binary(&flip_last_byte(&original)).unwrap();
        let result = h.engine.verify_integrity(Path::new(ROCK), "ci").await.unwrap();

        assert_eq!(result.status, IntegrityState::ManualInterventionRequired);
        assert_eq!(result.recovery, None);
        assert_eq!(
            result.attempts,
            vec!["restored_from_backup".to_string(), "reverted_to_last_good".to_string()]
        );
        let event = result.event.as_ref().unwrap();
        assert!(event.requires_manual_intervention);
        assert_eq!(
            event.annotations.get("recovery_attempts").map(String::as_str),
            Some("restored_from_backup,reverted_to_last_good")
        );
        assert!(!h.engine.record(Path::new(ROCK)).unwrap().unwrap().backups[0].healthy);

        let resolved = h.engine.resolve_manual_intervention(Path::new(ROCK), "lead").await.unwrap();
        assert_eq!(resolved.state, IntegrityState::Valid);
        assert_eq!(resolved.events.len(), 1);
    }

    #[tokio::test]
    async fn history_revert_runs_when_no_backup_survives() {
        let h = harness();
        let original = mesh();
        let graph = Arc::new(CommitGraph::new(
            h.database.clone(),
            Refs::new(h.dir.path().join(".hoard/refs").into_boxed_path()),
        ));
        let project = ProjectId::try_parse("arena").unwrap();
        let branch = BranchName::try_parse("main").unwrap();

        let put = h
            .database
            .put(Bytes::from(original.clone()), &ObjectMetadata::for_path(ROCK))
            .unwrap();
        let entry = TreeEntry::new(ROCK.to_string(), put.oid.clone(), put.size, EntryMode::Regular, EntryKind::Asset);
        let request = CommitRequest::new(
            project.clone(),
            Author::try_parse("artist").unwrap(),
            "add rock".to_string(),
            vec![entry],
        );
        graph.commit_to_branch(&branch, request).unwrap();

        let engine = engine_for(&h).with_history(HistorySource::new(graph, project, branch, 10));

        h.dir.child(ROCK).write_binary(&original).unwrap();
        let mut record = engine.track_asset(Path::new(ROCK), "artist").await.unwrap();
        // the backup shares its object with the commit, so disable it instead of deleting it
        for backup in &mut record.backups {
            backup.healthy = false;
        }
        IntegrityRecords::new(h.dir.path().join(".hoard/integrity").into_boxed_path())
            .save(&record)
            .unwrap();

        h.dir.child(ROCK).write_binary(&flip_last_byte(&original)).unwrap();
        let result = engine.verify_integrity(Path::new(ROCK), "ci").await.unwrap();

        assert_eq!(result.recovery, Some(RecoveryMethod::RevertedToLastGood));
        assert_eq!(std::fs::read(h.dir.child(ROCK).path()).unwrap(), original);
    }

    fn engine_for(h: &Harness) -> IntegrityEngine {
        IntegrityEngine::new(
            h.database.clone(),
            Arc::new(Workspace::new(h.dir.path().to_path_buf().into_boxed_path())),
            IntegrityRecords::new(h.dir.path().join(".hoard/integrity").into_boxed_path()),
            h.alerts.clone(),
        )
    }

    #[tokio::test]
    async fn blueprint_with_appended_garbage_is_structurally_repaired() {
        let h = harness();
        let path = "Content/BP_Door.uasset";
        let original = blueprint();
        h.dir.child(path).write_binary(&original).unwrap();
        let record = h.engine.track_asset(Path::new(path), "artist").await.unwrap();
        assert_eq!(record.criticality, Criticality::High);
        std::fs::remove_file(h.database.objects_path().join(record.backups[0].oid.to_path())).unwrap();

        let mut damaged = original.clone();
        damaged.extend_from_slice(b"\0\0junk");
        h.dir.child(path).write_binary(&damaged).unwrap();
        let result = h.engine.verify_integrity(Path::new(path), "ci").await.unwrap();

        assert_eq!(result.recovery, Some(RecoveryMethod::StructuralRepair));
        assert_eq!(std::fs::read(h.dir.child(path).path()).unwrap(), original);
    }

    #[tokio::test]
    async fn critical_blueprint_is_never_auto_recovered() {
        let h = harness();
        let path = "Content/BP_ArenaGameMode.uasset";
        let original = PackageFixture::default()
            .with_names(["BlueprintGeneratedClass", "BP_ArenaGameMode_C", "GameModeBase"])
            .build();
        h.dir.child(path).write_binary(&original).unwrap();
        h.engine.track_asset(Path::new(path), "designer").await.unwrap();

        h.dir.child(path).write_binary(&flip_last_byte(&original)).unwrap();
        let result = h.engine.verify_integrity(Path::new(path), "ci").await.unwrap();

        assert_eq!(result.event.as_ref().map(|event| event.severity), Some(Severity::Critical));
        assert!(result.event.as_ref().is_some_and(|event| event.requires_manual_intervention));
        assert_eq!(result.status, IntegrityState::ManualInterventionRequired);
        assert_eq!(result.suggested_fix, Some(SuggestedFix::RestoreFromBackup));
        assert!(matches!(result.into_result(), Err(IntegrityError::Corrupted { .. })));

        let second = h.engine.verify_integrity(Path::new(path), "ci").await.unwrap();
        assert_eq!(second.status, IntegrityState::ManualInterventionRequired);
        assert_eq!(h.alerts.events().len(), 2);
    }

    #[tokio::test]
    async fn untracked_and_valid_paths() {
        let h = harness();
        h.dir.child(ROCK).write_binary(&mesh()).unwrap();

        let untracked = h.engine.verify_integrity(Path::new(ROCK), "ci").await;
        assert!(matches!(untracked, Err(IntegrityError::NotTracked(_))));

        h.engine.track_asset(Path::new(ROCK), "artist").await.unwrap();
        let results = h.engine.verify_many(&[PathBuf::from(ROCK)], "ci").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.as_ref().unwrap().status, IntegrityState::Valid);

        let restore = h.engine.restore_from_backup(Path::new(ROCK), "artist").await;
        assert!(matches!(restore, Err(IntegrityError::InvalidTransition { .. })));
        assert_eq!(h.engine.tracked_paths().unwrap(), vec![ROCK.to_string()]);
        assert_eq!(h.engine.backup_roots().unwrap().len(), 1);
    }
}
