//! Plumbing commands (low-level object access)
//!
//! - `hash-object`: compute an object ID and optionally store the content
//! - `cat-file`: print a stored object
//! - `ls-tree`: list the entries of a tree

pub mod cat_file;
pub mod hash_object;
pub mod ls_tree;
