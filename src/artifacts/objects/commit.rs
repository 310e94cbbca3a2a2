//! Commit object
//!
//! Commits record one snapshot of a project:
//! - a tree object ID
//! - parent commit IDs (zero for a root, two or more for a merge)
//! - the project and author identifiers
//! - a timestamp in whole seconds
//! - the message
//!
//! ## Format
//!
//! ```text
//! commit <size>\0
//! tree <tree-id>
//! parent <parent-id>        (sorted, one line each)
//! project <project-id>
//! author <author-id>
//! timestamp <unix-seconds>
//!
//! <message>
//! ```
//!
//! The timestamp is part of the hashed payload, so two commits with identical
//! content only share an ID when they also share a timestamp.

use crate::artifacts::branch::branch_name::ProjectId;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Author identifier
///
/// Opaque to the engine; the metadata store owns the user behind it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Author(String);

impl Author {
    pub fn try_parse(id: impl Into<String>) -> anyhow::Result<Self> {
        let id = id.into();
        let id = id.trim();
        if id.is_empty() {
            anyhow::bail!("author id cannot be empty");
        }
        if id.chars().any(|c| c.is_control()) {
            anyhow::bail!("author id cannot contain control characters: {id:?}");
        }
        Ok(Self(id.to_string()))
    }

    /// Read the author from `HOARD_AUTHOR`.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let id = std::env::var("HOARD_AUTHOR").context("HOARD_AUTHOR not set")?;
        Self::try_parse(id)
    }
}

impl AsRef<str> for Author {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Truncate a timestamp to whole seconds, the precision stored in commits.
pub fn truncate_to_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp.timestamp(), 0)
        .single()
        .unwrap_or(timestamp)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    project: ProjectId,
    author: Author,
    message: String,
    tree_oid: ObjectId,
    /// Always sorted ascending and deduplicated.
    parents: Vec<ObjectId>,
    timestamp: DateTime<Utc>,
}

impl Commit {
    pub fn new(
        project: ProjectId,
        author: Author,
        message: String,
        tree_oid: ObjectId,
        mut parents: Vec<ObjectId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        parents.sort();
        parents.dedup();

        Commit {
            project,
            author,
            message,
            tree_oid,
            parents,
            timestamp: truncate_to_seconds(timestamp),
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message, for one-line displays.
    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parents(&self) -> &[ObjectId] {
        &self.parents
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn readable_timestamp(&self) -> String {
        self.timestamp.format("%a %b %-d %H:%M:%S %Y %z").to_string()
    }

    fn header_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        for parent in &self.parents {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("project {}", self.project));
        lines.push(format!("author {}", self.author));
        lines.push(format!("timestamp {}", self.timestamp.timestamp()));
        lines
    }
}

impl Packable for Commit {
    fn payload(&self) -> anyhow::Result<Bytes> {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.clone());

        Ok(Bytes::from(lines.join("\n")))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;

        let (header, message) = content
            .split_once("\n\n")
            .context("invalid commit object: missing message separator")?;
        let mut lines = header.lines();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .context("invalid commit object: missing tree line")?;
        let tree_oid = ObjectId::try_parse(tree_oid)?;

        let mut parents = Vec::new();
        let mut next_line = lines
            .next()
            .context("invalid commit object: missing project line")?;

        while let Some(parent) = next_line.strip_prefix("parent ") {
            parents.push(ObjectId::try_parse(parent)?);
            next_line = lines
                .next()
                .context("invalid commit object: missing project line")?;
        }

        let project = next_line
            .strip_prefix("project ")
            .context("invalid commit object: invalid project line")?;
        let project = ProjectId::try_parse(project)?;

        let author = lines
            .next()
            .and_then(|line| line.strip_prefix("author "))
            .context("invalid commit object: missing author line")?;
        let author = Author::try_parse(author)?;

        let timestamp = lines
            .next()
            .and_then(|line| line.strip_prefix("timestamp "))
            .context("invalid commit object: missing timestamp line")?
            .parse::<i64>()
            .context("invalid commit object: invalid timestamp")?;
        let timestamp = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .context("invalid commit object: timestamp out of range")?;

        if lines.next().is_some() {
            anyhow::bail!("invalid commit object: unexpected header line");
        }

        Ok(Self::new(
            project,
            author,
            message.to_string(),
            tree_oid,
            parents,
            timestamp,
        ))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        let mut lines = self.header_lines();
        lines.push(String::new());
        lines.push(self.message.clone());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn commit_with_parents(parents: Vec<ObjectId>) -> Commit {
        Commit::new(
            ProjectId::try_parse("shooter").unwrap(),
            Author::try_parse("artist-7").unwrap(),
            "Retopologise hero mesh\n\nLOD0 only".to_string(),
            ObjectId::digest(b"tree"),
            parents,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn parent_order_does_not_change_the_id() {
        let a = ObjectId::digest(b"a");
        let b = ObjectId::digest(b"b");

        let forward = commit_with_parents(vec![a.clone(), b.clone()]);
        let backward = commit_with_parents(vec![b, a]);

        assert_eq!(forward.object_id().unwrap(), backward.object_id().unwrap());
    }

    #[test]
    fn deserialize_restores_merge_commit() {
        let commit = commit_with_parents(vec![ObjectId::digest(b"a"), ObjectId::digest(b"b")]);
        let parsed = Commit::deserialize(Cursor::new(commit.payload().unwrap())).unwrap();

        assert_eq!(parsed, commit);
        assert!(parsed.is_merge());
        assert_eq!(parsed.short_message(), "Retopologise hero mesh");
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let precise = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        let commit = Commit::new(
            ProjectId::try_parse("p").unwrap(),
            Author::try_parse("a").unwrap(),
            "m".to_string(),
            ObjectId::digest(b"t"),
            vec![],
            precise,
        );

        assert_eq!(commit.timestamp().timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn author_rejects_blank_ids() {
        assert!(Author::try_parse("   ").is_err());
        assert!(Author::try_parse("line\nbreak").is_err());
    }
}
