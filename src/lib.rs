//! hoard: content-addressed version control for binary game assets
//!
//! - `areas`: stateful components (object store, refs, commit graph,
//!   integrity engine, workspace) and the `Repository` composition root
//! - `artifacts`: values and pure algorithms (objects, diffs, history walks,
//!   the binary asset analyzer, integrity records)
//! - `commands`: CLI command implementations on `Repository`
//! - `config`: environment-driven settings
//! - `errors`: error enums of the core subsystems

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod config;
pub mod errors;
