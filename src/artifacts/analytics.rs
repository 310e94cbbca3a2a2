//! Analytics payload
//!
//! Built after a commit and handed to whatever analytics sink the caller
//! runs. Nothing in the repository reads it back.

use crate::artifacts::analyzer::AssetInfo;
use crate::artifacts::analyzer::asset_type::AssetType;
use crate::artifacts::analyzer::blueprint::BlueprintSubtype;
use crate::artifacts::branch::branch_name::ProjectId;
use crate::artifacts::diff::tree_diff::ChangeKind;
use crate::artifacts::objects::commit::Author;
use crate::artifacts::objects::object_id::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub commit: ObjectId,
    pub project: ProjectId,
    pub author: Author,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<FileAnalytics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalytics {
    pub path: String,
    pub change: ChangeKind,
    pub content_hash: ObjectId,
    pub size: u64,
    /// Absent for deleted files.
    pub asset_type: Option<AssetType>,
    pub is_blueprint: bool,
    pub blueprint_subtype: Option<BlueprintSubtype>,
    pub dependencies: Vec<String>,
}

impl FileAnalytics {
    pub fn new(path: String, change: ChangeKind, content_hash: ObjectId, size: u64, info: Option<AssetInfo>) -> Self {
        let dependencies = info
            .as_ref()
            .map(|info| info.dependency_targets().into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        FileAnalytics {
            path,
            change,
            content_hash,
            size,
            asset_type: info.as_ref().map(|info| info.asset_type),
            is_blueprint: info.as_ref().is_some_and(|info| info.is_blueprint),
            blueprint_subtype: info.and_then(|info| info.blueprint_subtype),
            dependencies,
        }
    }
}
