//! Batch ingestion
//!
//! A client syncing many files sends one transaction: the digests it intends
//! to upload with their metadata, plus the `path -> digest` mapping of the
//! files those digests belong to. Each digest resolves to one
//! [`IngestOutcome`]; the [`BatchReport`] is folded from those outcomes.

use crate::artifacts::database::object_metadata::ObjectMetadata;
use crate::artifacts::objects::object_id::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchIngest {
    pub objects: BTreeMap<ObjectId, ObjectMetadata>,
    pub files: BTreeMap<String, ObjectId>,
}

impl BatchIngest {
    pub fn digests(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestOutcome {
    Stored { size: u64 },
    /// Already present; the client did not need to send the bytes.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: BTreeMap<ObjectId, IngestOutcome>,
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_stored: u64,
    /// File paths whose digest is neither stored nor ingested by this batch.
    pub unresolved_paths: Vec<String>,
}

impl BatchReport {
    fn record(mut self, oid: ObjectId, outcome: IngestOutcome) -> Self {
        match &outcome {
            IngestOutcome::Stored { size } => {
                self.stored += 1;
                self.bytes_stored += size;
            }
            IngestOutcome::Skipped => self.skipped += 1,
            IngestOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.insert(oid, outcome);
        self
    }

    pub fn with_unresolved_paths(mut self, paths: Vec<String>) -> Self {
        self.unresolved_paths = paths;
        self
    }

    pub fn outcome(&self, oid: &ObjectId) -> Option<&IngestOutcome> {
        self.outcomes.get(oid)
    }

    /// Every digest landed and every file path resolves.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.unresolved_paths.is_empty()
    }
}

impl FromIterator<(ObjectId, IngestOutcome)> for BatchReport {
    fn from_iter<I: IntoIterator<Item = (ObjectId, IngestOutcome)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BatchReport::default(), |report, (oid, outcome)| {
                report.record(oid, outcome)
            })
    }
}
