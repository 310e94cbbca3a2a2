//! Data structures and algorithms
//!
//! - `analytics`: write-only commit analytics payload
//! - `analyzer`: binary asset parsing, classification and dependency graphs
//! - `branch`: branch names and project ids
//! - `database`: object metadata and batch ingestion values
//! - `diff`: tree diffing
//! - `integrity`: integrity records, checks, events and scoring
//! - `log`: commit history traversal
//! - `objects`: object types (blob, tree, commit)

pub mod analytics;
pub mod analyzer;
pub mod branch;
pub mod database;
pub mod diff;
pub mod integrity;
pub mod log;
pub mod objects;
