use crate::areas::database::Database;
use crate::artifacts::branch::branch_name::ProjectId;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{GraphError, StoreError};
use chrono::{DateTime, Utc};
use derive_new::new;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// One commit in a history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub oid: ObjectId,
    pub commit: Commit,
}

/// Ready-queue key: newest first, ties broken by ID so the order is stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Ready {
    timestamp: DateTime<Utc>,
    oid: ObjectId,
}

/// History walk over one project's commit DAG.
#[derive(Debug, new)]
pub struct RevList<'d> {
    database: &'d Database,
    project: &'d ProjectId,
}

impl RevList<'_> {
    /// Walk from `head` and return up to `limit` commits, children before parents
    ///
    /// Discovery is breadth-first with a visited set, so diamonds are loaded
    /// once, and stops after `limit` commits; nothing past that window is
    /// read. Emission is a Kahn topological sort over the discovered commits:
    /// a commit is emitted only after every discovered child has been.
    pub fn walk(&self, head: &ObjectId, limit: usize) -> Result<Vec<HistoryEntry>, GraphError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let commits = self.discover(head, limit)?;

        let mut pending_children = commits
            .keys()
            .map(|oid| (oid.clone(), 0usize))
            .collect::<HashMap<_, _>>();
        for commit in commits.values() {
            for parent in commit.parents() {
                if let Some(count) = pending_children.get_mut(parent) {
                    *count += 1;
                }
            }
        }

        let mut ready = pending_children
            .iter()
            .filter(|(_, count)| **count == 0)
            .filter_map(|(oid, _)| commits.get(oid).map(|commit| Self::ready(oid, commit)))
            .collect::<BinaryHeap<_>>();

        let mut history = Vec::with_capacity(limit.min(commits.len()));
        while let Some(Ready { oid, .. }) = ready.pop() {
            let Some(commit) = commits.get(&oid) else {
                continue;
            };

            for parent in commit.parents() {
                if let Some(count) = pending_children.get_mut(parent) {
                    *count -= 1;
                    if *count == 0
                        && let Some(parent_commit) = commits.get(parent)
                    {
                        ready.push(Self::ready(parent, parent_commit));
                    }
                }
            }

            history.push(HistoryEntry {
                oid,
                commit: commit.clone(),
            });
            if history.len() >= limit {
                break;
            }
        }

        Ok(history)
    }

    fn ready(oid: &ObjectId, commit: &Commit) -> Ready {
        Ready {
            timestamp: commit.timestamp(),
            oid: oid.clone(),
        }
    }

    fn discover(&self, head: &ObjectId, limit: usize) -> Result<HashMap<ObjectId, Commit>, GraphError> {
        let mut commits = HashMap::new();
        let mut queue = VecDeque::from([head.clone()]);

        while commits.len() < limit
            && let Some(oid) = queue.pop_front()
        {
            if commits.contains_key(&oid) {
                continue;
            }

            let commit = self.load(&oid)?;
            for parent in commit.parents() {
                if !commits.contains_key(parent) {
                    queue.push_back(parent.clone());
                }
            }
            commits.insert(oid, commit);
        }

        Ok(commits)
    }

    fn load(&self, oid: &ObjectId) -> Result<Commit, GraphError> {
        let not_found = || GraphError::CommitNotFound {
            project: self.project.clone(),
            oid: oid.clone(),
        };

        match self.database.load_commit(oid) {
            Ok(commit) if commit.project() == self.project => Ok(commit),
            Ok(_) | Err(StoreError::NotFound(_)) | Err(StoreError::UnexpectedType { .. }) => {
                Err(not_found())
            }
            Err(e) => Err(e.into()),
        }
    }
}
