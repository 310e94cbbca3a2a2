use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Advisory metadata accompanying a `put`
///
/// Never part of an object's identity: two puts of the same bytes with
/// different metadata land on the same object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct ObjectMetadata {
    pub media_type: Option<String>,
    pub origin_path: Option<String>,
    /// Size the client claims to send; checked against the payload when present.
    pub declared_size: Option<u64>,
}

impl ObjectMetadata {
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            origin_path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Result of a `put`: the digest and size are returned whether or not bytes were written.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct PutOutcome {
    pub oid: ObjectId,
    pub size: u64,
    /// `false` when the content was already present and nothing was written.
    pub newly_stored: bool,
}

/// Summary of a sweep over the object directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub scanned: usize,
    pub retained: usize,
    /// Unreferenced objects kept because they are younger than the grace period.
    pub deferred: usize,
    pub removed: Vec<ObjectId>,
    pub reclaimed_bytes: u64,
}
