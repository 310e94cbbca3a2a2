use crate::areas::commit_graph::CommitGraph;
use crate::areas::database::Database;
use crate::areas::integrity::{HistorySource, IntegrityEngine};
use crate::areas::integrity_records::IntegrityRecords;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::artifacts::analytics::{AnalyticsRecord, FileAnalytics};
use crate::artifacts::analyzer::analyze_or_scan;
use crate::artifacts::branch::branch_name::{BranchName, ProjectId};
use crate::artifacts::database::object_metadata::CleanupReport;
use crate::artifacts::diff::tree_diff::{ChangeKind, diff_trees};
use crate::artifacts::integrity::alert::{AlertSink, TracingAlertSink};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::config::HoardConfig;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const HOARD_DIR: &str = ".hoard";

/// Composition root: one object store shared by the commit graph and the
/// integrity engine, plus the working copy they operate on.
pub struct Repository {
    path: Box<Path>,
    writer: RefCell<Box<dyn std::io::Write>>,
    config: HoardConfig,
    database: Arc<Database>,
    workspace: Arc<Workspace>,
    graph: Arc<CommitGraph>,
    integrity: IntegrityEngine,
}

impl Repository {
    pub fn new(path: &str, writer: Box<dyn std::io::Write>, config: HoardConfig) -> anyhow::Result<Self> {
        Self::with_alerts(path, writer, config, Arc::new(TracingAlertSink))
    }

    pub fn with_alerts(
        path: &str,
        writer: Box<dyn std::io::Write>,
        config: HoardConfig,
        alerts: Arc<dyn AlertSink>,
    ) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
        }
        let path = path.canonicalize()?;
        let hoard = path.join(HOARD_DIR);

        let database = Arc::new(Database::new(
            hoard.join("objects").into_boxed_path(),
            hoard.join("uploads").into_boxed_path(),
        ));
        let workspace = Arc::new(Workspace::new(path.clone().into_boxed_path()));
        let refs = Refs::new(hoard.join("refs").into_boxed_path());
        let graph = Arc::new(CommitGraph::new(database.clone(), refs));

        let integrity = IntegrityEngine::new(
            database.clone(),
            workspace.clone(),
            IntegrityRecords::new(hoard.join("integrity").into_boxed_path()),
            alerts,
        )
        .with_history(HistorySource::new(
            graph.clone(),
            config.project.clone(),
            config.branch.clone(),
            config.history_depth,
        ));

        Ok(Repository {
            path: path.into_boxed_path(),
            writer: RefCell::new(writer),
            config,
            database,
            workspace,
            graph,
            integrity,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hoard_path(&self) -> std::path::PathBuf {
        self.path.join(HOARD_DIR)
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn std::io::Write>> {
        self.writer.borrow_mut()
    }

    pub fn config(&self) -> &HoardConfig {
        &self.config
    }

    pub fn project(&self) -> &ProjectId {
        &self.config.project
    }

    pub fn branch_name(&self) -> &BranchName {
        &self.config.branch
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    pub fn integrity(&self) -> &IntegrityEngine {
        &self.integrity
    }

    /// Resolve a branch name of the current project, or a full object id.
    pub fn resolve_revision(&self, revision: &str) -> anyhow::Result<ObjectId> {
        if let Ok(branch) = BranchName::try_parse(revision)
            && let Some(head) = self.graph.head(self.project(), &branch)?
        {
            return Ok(head);
        }

        ObjectId::try_parse(revision)
            .with_context(|| format!("{revision:?} is neither a branch of {} nor an object id", self.project()))
    }

    /// Objects reachable from any branch of any project, plus integrity backups.
    pub fn live_objects(&self) -> anyhow::Result<HashSet<ObjectId>> {
        let mut live = self.integrity.backup_roots()?;

        for project in self.graph.list_projects()? {
            for branch in self.graph.list_branches(&project)? {
                for entry in self.graph.history(&project, &branch, usize::MAX)? {
                    let tree_oid = entry.commit.tree_oid().clone();
                    if live.insert(tree_oid.clone()) {
                        let tree = self.graph.load_tree(&tree_oid)?;
                        live.extend(tree.entries().map(|file| file.oid.clone()));
                    }
                    live.insert(entry.oid);
                }
            }
        }

        Ok(live)
    }

    /// Remove unreachable objects older than `grace`.
    pub fn cleanup(&self, grace: Duration) -> anyhow::Result<CleanupReport> {
        let live = self.live_objects()?;
        let report = self.database.cleanup(&live, grace)?;

        info!(
            live = live.len(),
            removed = report.removed.len(),
            deferred = report.deferred,
            "garbage collection finished"
        );
        Ok(report)
    }

    /// Build the analytics payload describing what a commit changed.
    pub fn analytics_for_commit(&self, project: &ProjectId, oid: &ObjectId) -> anyhow::Result<AnalyticsRecord> {
        let commit = self.graph.load_commit(project, oid)?;
        let tree = self.graph.load_tree(commit.tree_oid())?;
        let parent_tree = match commit.parents().first() {
            Some(parent) => self.graph.load_commit_tree(project, parent)?,
            None => Tree::default(),
        };

        let mut files = Vec::new();
        for diff in diff_trees(&parent_tree, &tree) {
            let entry = match diff.kind {
                ChangeKind::Deleted => diff.old,
                ChangeKind::Added | ChangeKind::Modified => diff.new,
            }
            .with_context(|| format!("diff of {} lacks an entry", diff.path))?;

            let analysis = match diff.kind {
                ChangeKind::Deleted => None,
                _ => {
                    let (content, _) = self.database.get(&entry.oid)?;
                    Some(analyze_or_scan(Path::new(&diff.path), &content).info)
                }
            };
            files.push(FileAnalytics::new(diff.path, diff.kind, entry.oid, entry.size, analysis));
        }

        Ok(AnalyticsRecord {
            commit: oid.clone(),
            project: project.clone(),
            author: commit.author().clone(),
            message: commit.message().to_string(),
            timestamp: commit.timestamp(),
            files,
        })
    }
}
