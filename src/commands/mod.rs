//! Command implementations
//!
//! Commands are `impl Repository` blocks, organized in two groups:
//!
//! - `plumbing`: low-level object access (hash-object, cat-file, ls-tree)
//! - `porcelain`: user-facing workflows (commit, log, verify, etc.)

pub mod plumbing;
pub mod porcelain;
