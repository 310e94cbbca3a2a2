//! Commit graph engine
//!
//! Builds trees and commits over content already in the object store and
//! moves branch heads. Trees and commits are immutable once written, so
//! history reads need no locking; only branch refs are mutable, and those move
//! by compare-and-swap.

use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::branch_name::{BranchName, ProjectId};
use crate::artifacts::diff::tree_diff::{DiffFilter, FileDiff, diff_trees};
use crate::artifacts::log::rev_list::{HistoryEntry, RevList};
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::{Tree, TreeEntry};
use crate::errors::{GraphError, StoreError};
use chrono::{DateTime, Utc};
use derive_new::new;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything needed to create one commit.
#[derive(Debug, Clone, new)]
pub struct CommitRequest {
    pub project: ProjectId,
    pub author: Author,
    pub message: String,
    /// Files of the snapshot, in any order; every digest must already be stored.
    pub files: Vec<TreeEntry>,
    #[new(default)]
    pub parents: Vec<ObjectId>,
    /// Pinned commit time; `None` uses the current time.
    #[new(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommitRequest {
    pub fn with_parents(mut self, parents: Vec<ObjectId>) -> Self {
        self.parents = parents;
        self
    }

    pub fn at(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A distinct version of one path found while walking history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersion {
    pub commit_oid: ObjectId,
    pub timestamp: DateTime<Utc>,
    pub entry: TreeEntry,
}

#[derive(Debug)]
pub struct CommitGraph {
    database: Arc<Database>,
    refs: Refs,
}

impl CommitGraph {
    pub fn new(database: Arc<Database>, refs: Refs) -> Self {
        CommitGraph { database, refs }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    /// Persist the tree and commit for `request`
    ///
    /// The tree is sorted by path here, so the caller's file order never
    /// affects the resulting IDs. The commit ID covers the timestamp.
    pub fn create_commit(&self, request: CommitRequest) -> Result<(ObjectId, Commit), GraphError> {
        let CommitRequest {
            project,
            author,
            message,
            files,
            parents,
            timestamp,
        } = request;

        if let Some(entry) = files.iter().find(|entry| !self.database.exists(&entry.oid)) {
            return Err(StoreError::NotFound(entry.oid.clone()).into());
        }
        for parent in &parents {
            self.load_commit(&project, parent)?;
        }

        let tree = Tree::build(files)?;
        let (tree_oid, _) = self.database.store(&tree)?;

        let commit = Commit::new(
            project,
            author,
            message,
            tree_oid,
            parents,
            timestamp.unwrap_or_else(Utc::now),
        );
        let (commit_oid, newly_stored) = self.database.store(&commit)?;

        debug!(
            project = %commit.project(),
            commit = %commit_oid.to_short_oid(),
            tree = %commit.tree_oid().to_short_oid(),
            files = tree.len(),
            newly_stored,
            "commit created"
        );

        Ok((commit_oid, commit))
    }

    /// Move `branch` to `new` if it still points at `expected`.
    pub fn update_branch_head(
        &self,
        project: &ProjectId,
        branch: &BranchName,
        new: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> Result<(), GraphError> {
        self.load_commit(project, new)?;
        self.refs.compare_and_swap(project, branch, new, expected)
    }

    /// Create a commit on top of the branch head and advance the branch
    ///
    /// The current head is added to the parents already in the request, so a
    /// request carrying other parents records a merge.
    pub fn commit_to_branch(
        &self,
        branch: &BranchName,
        request: CommitRequest,
    ) -> Result<(ObjectId, Commit), GraphError> {
        let project = request.project.clone();
        let head = self.refs.read_head(&project, branch)?;

        let mut parents = request.parents.clone();
        parents.extend(head.clone());
        let (oid, commit) = self.create_commit(request.with_parents(parents))?;

        self.update_branch_head(&project, branch, &oid, head.as_ref())?;
        info!(project = %project, branch = %branch, commit = %oid.to_short_oid(), "committed to branch");

        Ok((oid, commit))
    }

    pub fn head(&self, project: &ProjectId, branch: &BranchName) -> Result<Option<ObjectId>, GraphError> {
        self.refs.read_head(project, branch)
    }

    fn require_head(&self, project: &ProjectId, branch: &BranchName) -> Result<ObjectId, GraphError> {
        self.head(project, branch)?
            .ok_or_else(|| GraphError::BranchNotFound {
                project: project.clone(),
                branch: branch.clone(),
            })
    }

    /// Up to `limit` commits reachable from the branch head, children before parents.
    pub fn history(
        &self,
        project: &ProjectId,
        branch: &BranchName,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, GraphError> {
        let head = self.require_head(project, branch)?;
        RevList::new(&self.database, project).walk(&head, limit)
    }

    pub fn diff(
        &self,
        project: &ProjectId,
        from: &ObjectId,
        to: &ObjectId,
    ) -> Result<Vec<FileDiff>, GraphError> {
        self.diff_filtered(project, from, to, DiffFilter::all())
    }

    pub fn diff_filtered(
        &self,
        project: &ProjectId,
        from: &ObjectId,
        to: &ObjectId,
        filter: DiffFilter,
    ) -> Result<Vec<FileDiff>, GraphError> {
        if from == to {
            self.load_commit(project, from)?;
            return Ok(Vec::new());
        }

        let from_tree = self.load_commit_tree(project, from)?;
        let to_tree = self.load_commit_tree(project, to)?;

        Ok(diff_trees(&from_tree, &to_tree)
            .into_iter()
            .filter(|diff| diff.kind.matches_filter(filter))
            .collect())
    }

    /// Distinct versions of `path` along a branch's history, newest first.
    pub fn find_file_versions(
        &self,
        project: &ProjectId,
        branch: &BranchName,
        path: &str,
        limit: usize,
    ) -> Result<Vec<FileVersion>, GraphError> {
        let mut versions: Vec<FileVersion> = Vec::new();

        for HistoryEntry { oid, commit } in self.history(project, branch, limit)? {
            let tree = self.load_tree(commit.tree_oid())?;
            let Some(entry) = tree.get(path) else {
                continue;
            };

            if versions.iter().any(|version| version.entry.same_content(entry)) {
                continue;
            }
            versions.push(FileVersion {
                commit_oid: oid,
                timestamp: commit.timestamp(),
                entry: entry.clone(),
            });
        }

        Ok(versions)
    }

    /// Load a commit and check that it belongs to `project`.
    pub fn load_commit(&self, project: &ProjectId, oid: &ObjectId) -> Result<Commit, GraphError> {
        let not_found = || GraphError::CommitNotFound {
            project: project.clone(),
            oid: oid.clone(),
        };

        match self.database.load_commit(oid) {
            Ok(commit) if commit.project() == project => Ok(commit),
            Ok(_) | Err(StoreError::NotFound(_)) | Err(StoreError::UnexpectedType { .. }) => {
                Err(not_found())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn load_tree(&self, oid: &ObjectId) -> Result<Tree, GraphError> {
        Ok(self.database.load_tree(oid)?)
    }

    pub fn load_commit_tree(&self, project: &ProjectId, oid: &ObjectId) -> Result<Tree, GraphError> {
        let commit = self.load_commit(project, oid)?;
        self.load_tree(commit.tree_oid())
    }

    pub fn list_branches(&self, project: &ProjectId) -> Result<Vec<BranchName>, GraphError> {
        self.refs.list_branches(project)
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectId>, GraphError> {
        self.refs.list_projects()
    }

    pub fn delete_branch(&self, project: &ProjectId, branch: &BranchName) -> Result<ObjectId, GraphError> {
        self.refs.delete_branch(project, branch)
    }

    /// Create a branch at an existing commit.
    pub fn create_branch(
        &self,
        project: &ProjectId,
        branch: &BranchName,
        at: &ObjectId,
    ) -> Result<(), GraphError> {
        self.update_branch_head(project, branch, at, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::database::object_metadata::ObjectMetadata;
    use crate::artifacts::objects::entry_mode::{EntryKind, EntryMode};
    use assert_fs::TempDir;
    use bytes::Bytes;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn graph(dir: &TempDir) -> CommitGraph {
        let database = Database::new(
            dir.path().join("objects").into_boxed_path(),
            dir.path().join("uploads").into_boxed_path(),
        );
        CommitGraph::new(
            Arc::new(database),
            Refs::new(dir.path().join("refs").into_boxed_path()),
        )
    }

    fn project() -> ProjectId {
        ProjectId::try_parse("shooter").unwrap()
    }

    fn author() -> Author {
        Author::try_parse("artist-7").unwrap()
    }

    fn stored(graph: &CommitGraph, path: &str, content: &'static [u8]) -> TreeEntry {
        let outcome = graph
            .database()
            .put(Bytes::from_static(content), &ObjectMetadata::for_path(path))
            .unwrap();
        TreeEntry::new(
            path.to_string(),
            outcome.oid,
            outcome.size,
            EntryMode::Regular,
            EntryKind::Blob,
        )
    }

    fn pinned() -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap())
    }

    #[rstest]
    fn identical_requests_yield_identical_ids(temp_dir: TempDir) {
        let graph = graph(&temp_dir);
        let a = stored(&graph, "a.txt", b"alpha");
        let b = stored(&graph, "b.txt", b"beta");

        let first = CommitRequest::new(project(), author(), "snapshot".into(), vec![a.clone(), b.clone()])
            .at(pinned());
        let second = CommitRequest::new(project(), author(), "snapshot".into(), vec![b, a]).at(pinned());

        let (first_oid, first_commit) = graph.create_commit(first).unwrap();
        let (second_oid, second_commit) = graph.create_commit(second).unwrap();

        assert_eq!(first_oid, second_oid);
        assert_eq!(first_commit.tree_oid(), second_commit.tree_oid());
    }

    #[rstest]
    fn unknown_content_is_rejected(temp_dir: TempDir) {
        let graph = graph(&temp_dir);
        let ghost = TreeEntry::new(
            "ghost.uasset".to_string(),
            ObjectId::digest(b"never stored"),
            12,
            EntryMode::Regular,
            EntryKind::Asset,
        );

        let result = graph.create_commit(CommitRequest::new(project(), author(), "m".into(), vec![ghost]));
        assert!(matches!(result, Err(GraphError::Store(StoreError::NotFound(_)))));
    }

    #[rstest]
    fn parent_from_another_project_is_not_found(temp_dir: TempDir) {
        let graph = graph(&temp_dir);
        let other = ProjectId::try_parse("racer").unwrap();
        let (foreign, _) = graph
            .create_commit(CommitRequest::new(other, author(), "m".into(), vec![]))
            .unwrap();

        let result = graph.create_commit(
            CommitRequest::new(project(), author(), "m".into(), vec![]).with_parents(vec![foreign]),
        );
        assert!(matches!(result, Err(GraphError::CommitNotFound { .. })));
    }

    #[rstest]
    fn branch_head_never_points_at_a_missing_commit(temp_dir: TempDir) {
        let graph = graph(&temp_dir);
        let missing = ObjectId::digest(b"no such commit");

        let result = graph.update_branch_head(&project(), &BranchName::default(), &missing, None);

        assert!(matches!(result, Err(GraphError::CommitNotFound { .. })));
        assert_eq!(graph.head(&project(), &BranchName::default()).unwrap(), None);
    }

    #[rstest]
    fn merge_history_lists_children_before_parents(temp_dir: TempDir) {
        let graph = graph(&temp_dir);
        let main = BranchName::default();
        let at = |second: u32| Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, second).unwrap());

        let (root, _) = graph
            .create_commit(CommitRequest::new(project(), author(), "root".into(), vec![]).at(at(0)))
            .unwrap();
        // the side branch is newer than its sibling but older than the merge
        let (left, _) = graph
            .create_commit(
                CommitRequest::new(project(), author(), "left".into(), vec![])
                    .with_parents(vec![root.clone()])
                    .at(at(10)),
            )
            .unwrap();
        let (right, _) = graph
            .create_commit(
                CommitRequest::new(project(), author(), "right".into(), vec![])
                    .with_parents(vec![root.clone()])
                    .at(at(20)),
            )
            .unwrap();
        let (merge, _) = graph
            .create_commit(
                CommitRequest::new(project(), author(), "merge".into(), vec![])
                    .with_parents(vec![left.clone(), right.clone()])
                    .at(at(30)),
            )
            .unwrap();
        graph.update_branch_head(&project(), &main, &merge, None).unwrap();

        let history = graph
            .history(&project(), &main, 10)
            .unwrap()
            .into_iter()
            .map(|entry| entry.oid)
            .collect::<Vec<_>>();

        assert_eq!(history, vec![merge, right, left, root]);
        assert_eq!(graph.history(&project(), &main, 2).unwrap().len(), 2);
    }

    #[rstest]
    fn file_versions_skip_unchanged_commits(temp_dir: TempDir) {
        let graph = graph(&temp_dir);
        let main = BranchName::default();
        let v1 = stored(&graph, "hero.uasset", b"v1");
        let v2 = stored(&graph, "hero.uasset", b"v2");
        let readme = stored(&graph, "README", b"hello");

        let at = |second: u32| Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, second).unwrap());
        for (second, files) in [
            (1, vec![v1.clone()]),
            (2, vec![v1.clone(), readme.clone()]),
            (3, vec![v2.clone(), readme]),
        ] {
            graph
                .commit_to_branch(
                    &main,
                    CommitRequest::new(project(), author(), "wip".into(), files).at(at(second)),
                )
                .unwrap();
        }

        let versions = graph
            .find_file_versions(&project(), &main, "hero.uasset", 10)
            .unwrap()
            .into_iter()
            .map(|version| version.entry.oid)
            .collect::<Vec<_>>();

        assert_eq!(versions, vec![v2.oid, v1.oid]);
    }
}
