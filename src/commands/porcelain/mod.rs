//! Porcelain commands (user-facing workflows)
//!
//! ## Commands
//!
//! - `init`: initialize a new repository
//! - `commit`: snapshot the working copy onto the current branch
//! - `log`: show branch history
//! - `diff`: show files changed between two commits
//! - `branch`: create, list, or delete branches
//! - `analyze`: inspect engine assets and their dependencies
//! - `integrity`: track, verify, restore and resolve assets
//! - `gc`: remove unreachable objects

pub mod analyze;
pub mod branch;
pub mod commit;
pub mod diff;
pub mod gc;
pub mod init;
pub mod integrity;
pub mod log;
