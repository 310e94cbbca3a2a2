//! Commit history traversal
//!
//! `rev_list` walks a project's commit DAG from a branch head. The walk
//! discovers commits breadth-first and emits them in topological order
//! (every commit before all of its ancestors), newest first among commits
//! that are ready at the same time.

pub mod rev_list;
