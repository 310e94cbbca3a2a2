//! Tree comparison
//!
//! Trees are flat, so a diff is a single merge over two path-sorted maps:
//! every path present on either side is classified as added, deleted or
//! modified. Content-level diffs of binary assets are not attempted.

pub mod tree_diff;
