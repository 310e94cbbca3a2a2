use crate::artifacts::objects::tree::{Tree, TreeEntry};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DiffFilter: u32 {
        const ADDED = 0b0001;
        const DELETED = 0b0010;
        const MODIFIED = 0b0100;
    }
}

impl DiffFilter {
    pub fn try_parse(s: &str) -> Option<Self> {
        let mut filter = Self::empty();

        for c in s.chars() {
            match c {
                'A' => filter |= Self::ADDED,
                'D' => filter |= Self::DELETED,
                'M' => filter |= Self::MODIFIED,
                _ => return None,
            }
        }

        Some(filter)
    }
}

impl Default for DiffFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

impl ChangeKind {
    pub fn matches_filter(&self, filter: DiffFilter) -> bool {
        match self {
            ChangeKind::Added => filter.contains(DiffFilter::ADDED),
            ChangeKind::Deleted => filter.contains(DiffFilter::DELETED),
            ChangeKind::Modified => filter.contains(DiffFilter::MODIFIED),
        }
    }

    pub fn status_char(&self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Deleted => 'D',
            ChangeKind::Modified => 'M',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Modified => "modified",
        }
    }
}

/// One path that differs between two trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub kind: ChangeKind,
    pub old: Option<TreeEntry>,
    pub new: Option<TreeEntry>,
}

impl FileDiff {
    fn from_entries(path: &str, old: Option<&TreeEntry>, new: Option<&TreeEntry>) -> Option<Self> {
        let kind = match (old, new) {
            (None, Some(_)) => ChangeKind::Added,
            (Some(_), None) => ChangeKind::Deleted,
            (Some(old), Some(new)) if !old.same_content(new) => ChangeKind::Modified,
            _ => return None,
        };

        Some(FileDiff {
            path: path.to_string(),
            kind,
            old: old.cloned(),
            new: new.cloned(),
        })
    }
}

/// Compare two flat trees path by path
///
/// The result is ordered by path. Entries whose digests agree produce
/// nothing, even if their mode differs.
pub fn diff_trees(from: &Tree, to: &Tree) -> Vec<FileDiff> {
    let paths = from
        .entries()
        .chain(to.entries())
        .map(|entry| entry.path.as_str())
        .collect::<BTreeSet<_>>();

    paths
        .into_iter()
        .filter_map(|path| FileDiff::from_entries(path, from.get(path), to.get(path)))
        .collect()
}
