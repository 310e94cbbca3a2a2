//! Core repository components
//!
//! - `database`: content-addressable object store
//! - `refs`: per-project branch heads with compare-and-swap updates
//! - `commit_graph`: commits, history, diffs and file versions
//! - `integrity`: asset tracking, verification and recovery
//! - `integrity_records`: on-disk persistence of integrity records
//! - `repository`: composition root wiring the stores together
//! - `workspace`: working copy file system operations

pub mod commit_graph;
pub mod database;
pub mod integrity;
pub mod integrity_records;
pub mod refs;
pub mod repository;
pub mod workspace;
