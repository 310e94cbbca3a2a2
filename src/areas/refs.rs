//! Branch references
//!
//! Each project owns its own namespace of branches. A branch is a plain file
//! under `refs/<project>/heads/<branch>` holding the 64-hex ID of its head
//! commit. Branch names may be hierarchical (`art/hero-rework`).
//!
//! ## Updates
//!
//! Heads only move through [`Refs::compare_and_swap`]: the caller states the
//! head it expects to replace, and the swap fails with `Conflict` when the ref
//! moved in the meantime. Updates to the same branch are serialised by an
//! in-process mutex and an exclusive `file_guard` lock on
//! `refs/<project>/locks/<branch>`. The new head is written to a temp file,
//! synced and renamed over the ref, so readers never see a partial ref.

use crate::artifacts::branch::branch_name::{BranchName, ProjectId};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::GraphError;
use dashmap::DashMap;
use fake::rand;
use file_guard::Lock;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct Refs {
    /// Path to the refs directory (`.hoard/refs`)
    path: Box<Path>,
    branch_locks: DashMap<(ProjectId, BranchName), Arc<Mutex<()>>>,
}

impl Refs {
    pub fn new(path: Box<Path>) -> Self {
        Refs {
            path,
            branch_locks: DashMap::new(),
        }
    }

    pub fn refs_path(&self) -> &Path {
        &self.path
    }

    pub fn heads_path(&self, project: &ProjectId) -> PathBuf {
        self.path.join(project.as_ref()).join("heads")
    }

    fn branch_lock(&self, project: &ProjectId, branch: &BranchName) -> Arc<Mutex<()>> {
        self.branch_locks
            .entry((project.clone(), branch.clone()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn branch_path(&self, project: &ProjectId, branch: &BranchName) -> PathBuf {
        self.heads_path(project).join(branch.as_ref())
    }

    fn lock_path(&self, project: &ProjectId, branch: &BranchName) -> PathBuf {
        self.path.join(project.as_ref()).join("locks").join(branch.as_ref())
    }

    /// Run `f` while holding both the in-process and the on-disk lock of a branch.
    ///
    /// Lock files are never removed: a process blocked on a removed lock file
    /// would hold a lock nobody else can see.
    fn with_branch_lock<T>(
        &self,
        project: &ProjectId,
        branch: &BranchName,
        f: impl FnOnce() -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        let branch_lock = self.branch_lock(project, branch);
        let _guard = branch_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let lock_path = self.lock_path(project, branch);
        let lock_dir = lock_path.parent().ok_or_else(|| GraphError::InvalidName(branch.to_string()))?;
        std::fs::create_dir_all(lock_dir).map_err(GraphError::io(lock_dir))?;

        let mut lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(GraphError::io(&lock_path))?;
        let _file_lock = file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1)
            .map_err(GraphError::io(&lock_path))?;

        f()
    }

    /// Replace the ref file with `oid` through a synced temp file and a rename.
    fn write_ref(&self, project: &ProjectId, branch: &BranchName, oid: &ObjectId) -> Result<(), GraphError> {
        let branch_path = self.branch_path(project, branch);
        let branch_dir = branch_path.parent().ok_or_else(|| GraphError::InvalidName(branch.to_string()))?;
        std::fs::create_dir_all(branch_dir).map_err(GraphError::io(branch_dir))?;

        let temp_dir = self.path.join(project.as_ref()).join("tmp");
        std::fs::create_dir_all(&temp_dir).map_err(GraphError::io(&temp_dir))?;
        let temp_path = temp_dir.join(format!("ref-{}", rand::random::<u32>()));

        let written = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .and_then(|mut file| {
                file.write_all(oid.as_ref().as_bytes())?;
                file.sync_all()
            })
            .and_then(|_| std::fs::rename(&temp_path, &branch_path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp_path);
            return Err(GraphError::io(&branch_path)(e));
        }

        Ok(())
    }

    /// Current head of a branch, `None` if the branch does not exist yet.
    pub fn read_head(
        &self,
        project: &ProjectId,
        branch: &BranchName,
    ) -> Result<Option<ObjectId>, GraphError> {
        let branch_path = self.branch_path(project, branch);
        if !branch_path.is_file() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(&branch_path) {
            Ok(content) => content,
            // deleted since the check above
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(GraphError::io(&branch_path)(e)),
        };
        Self::parse_ref_content(&content, &branch_path)
    }

    fn parse_ref_content(content: &str, path: &Path) -> Result<Option<ObjectId>, GraphError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        ObjectId::try_parse(content)
            .map(Some)
            .map_err(|e| GraphError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            })
    }

    /// Point `branch` at `new` if it currently points at `expected`
    ///
    /// `expected == None` means the branch must not exist yet.
    pub fn compare_and_swap(
        &self,
        project: &ProjectId,
        branch: &BranchName,
        new: &ObjectId,
        expected: Option<&ObjectId>,
    ) -> Result<(), GraphError> {
        self.with_branch_lock(project, branch, || {
            let actual = self.read_head(project, branch)?;
            if actual.as_ref() != expected {
                return Err(GraphError::Conflict {
                    project: project.clone(),
                    branch: branch.clone(),
                    expected: expected.cloned(),
                    actual,
                });
            }

            self.write_ref(project, branch, new)
        })?;

        info!(
            project = %project,
            branch = %branch,
            from = %expected.map(ObjectId::to_short_oid).unwrap_or_default(),
            to = %new.to_short_oid(),
            "branch head updated"
        );

        Ok(())
    }

    /// Remove a branch and return the head it pointed to.
    pub fn delete_branch(
        &self,
        project: &ProjectId,
        branch: &BranchName,
    ) -> Result<ObjectId, GraphError> {
        let oid = self.with_branch_lock(project, branch, || {
            let oid = self
                .read_head(project, branch)?
                .ok_or_else(|| GraphError::BranchNotFound {
                    project: project.clone(),
                    branch: branch.clone(),
                })?;

            let branch_path = self.branch_path(project, branch);
            std::fs::remove_file(&branch_path).map_err(GraphError::io(&branch_path))?;
            self.prune_branch_empty_parent_dirs(project, &branch_path)?;
            Ok(oid)
        })?;

        debug!(project = %project, branch = %branch, oid = %oid, "branch deleted");
        Ok(oid)
    }

    /// Branch names of one project, sorted.
    pub fn list_branches(&self, project: &ProjectId) -> Result<Vec<BranchName>, GraphError> {
        let heads_path = self.heads_path(project);
        if !heads_path.exists() {
            return Ok(Vec::new());
        }

        let mut branches = WalkDir::new(&heads_path)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(&heads_path).ok()?;
                let name = relative_path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                BranchName::try_parse(name).ok()
            })
            .collect::<Vec<_>>();
        branches.sort();

        Ok(branches)
    }

    /// Projects that have at least one ref directory.
    pub fn list_projects(&self) -> Result<Vec<ProjectId>, GraphError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&self.path).map_err(GraphError::io(&*self.path))? {
            let entry = entry.map_err(GraphError::io(&*self.path))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(project) = entry
                .file_name()
                .to_str()
                .and_then(|name| ProjectId::try_parse(name).ok())
            {
                projects.push(project);
            }
        }
        projects.sort();

        Ok(projects)
    }

    fn prune_branch_empty_parent_dirs(&self, project: &ProjectId, path: &Path) -> Result<(), GraphError> {
        let heads_path = self.heads_path(project);
        if let Some(parent) = path.parent()
            && parent != heads_path
            && parent.read_dir().map_err(GraphError::io(parent))?.next().is_none()
        {
            std::fs::remove_dir(parent).map_err(GraphError::io(parent))?;
            self.prune_branch_empty_parent_dirs(project, parent)?;
        }

        Ok(())
    }
}
