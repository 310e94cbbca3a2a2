//! Object store value types
//!
//! Inputs and results of object store operations: put metadata and outcomes,
//! batch ingestion transactions and cleanup reports.

pub mod batch;
pub mod object_metadata;
