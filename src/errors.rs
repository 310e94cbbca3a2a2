//! Error types for the core subsystems.
//!
//! Each subsystem surfaces its own enum. The command layer wraps them in
//! `anyhow` with context, the same way it wraps I/O failures.

use crate::artifacts::branch::branch_name::{BranchName, ProjectId};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::PathBuf;
use thiserror::Error;

/// Object store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {0} not found")]
    NotFound(ObjectId),

    #[error("upload session {session} is incomplete: expected {expected} chunks, found {found}")]
    IncompleteUpload {
        session: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid upload session id {0:?}")]
    InvalidSession(String),

    #[error("declared size {declared} does not match payload size {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("digest mismatch: expected {expected}, computed {actual}")]
    DigestMismatch { expected: ObjectId, actual: ObjectId },

    #[error("object {oid} is a {actual}, expected a {expected}")]
    UnexpectedType {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("malformed object {oid}: {reason}")]
    Malformed { oid: ObjectId, reason: String },

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}

/// Commit graph failures.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("commit {oid} not found in project {project}")]
    CommitNotFound { project: ProjectId, oid: ObjectId },

    #[error("branch {branch} not found in project {project}")]
    BranchNotFound { project: ProjectId, branch: BranchName },

    #[error(
        "branch {branch} in project {project} moved concurrently: expected {}, found {}",
        display_head(.expected),
        display_head(.actual)
    )]
    Conflict {
        project: ProjectId,
        branch: BranchName,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    #[error("path {0:?} appears more than once in the commit")]
    DuplicatePath(String),

    #[error("invalid tree path {0:?}")]
    InvalidPath(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| GraphError::Io { path, source }
    }
}

fn display_head(head: &Option<ObjectId>) -> String {
    head.as_ref()
        .map(ObjectId::to_string)
        .unwrap_or_else(|| "<unborn>".to_string())
}

/// Structural package parse failures. Partial table damage never surfaces here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("invalid package header: {reason}")]
    InvalidHeader { reason: String },

    #[error("{table} table offset {offset} is outside the {len}-byte buffer")]
    TableOutOfBounds {
        table: &'static str,
        offset: i64,
        len: usize,
    },
}

/// Integrity engine failures.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("asset {} is not tracked", .0.display())]
    NotTracked(PathBuf),

    #[error("asset {} is missing from the working copy", .0.display())]
    Missing(PathBuf),

    #[error("asset {} is corrupted: {failed_checks:?} failed", path.display())]
    Corrupted {
        path: PathBuf,
        failed_checks: Vec<String>,
    },

    #[error("automated recovery of {} failed after {attempts:?}", path.display())]
    RecoveryFailed {
        path: PathBuf,
        attempts: Vec<String>,
    },

    #[error("asset {} awaits manual intervention; resolve or restore it", .0.display())]
    AwaitingIntervention(PathBuf),

    #[error("{} is not an asset path inside the workspace", .0.display())]
    OutsideWorkspace(PathBuf),

    #[error("asset {} cannot move from {from} to {to}", path.display())]
    InvalidTransition {
        path: PathBuf,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("integrity record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IntegrityError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| IntegrityError::Io { path, source }
    }
}
