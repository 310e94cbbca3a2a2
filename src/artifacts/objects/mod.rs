//! Stored object types
//!
//! Everything in the object store is one of three kinds of object:
//!
//! - **Blob**: raw asset bytes, keyed by the SHA-256 of those bytes
//! - **Tree**: a path-sorted snapshot of `path -> blob` entries
//! - **Commit**: a tree plus parents, project, author, timestamp and message
//!
//! On disk every object is framed as `<type> <size>\0<payload>` and
//! zlib-compressed.

pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-256 digest in hexadecimal form
pub const OBJECT_ID_LENGTH: usize = 64;

/// Length of the abbreviated digest used in human-facing output
pub const SHORT_OBJECT_ID_LENGTH: usize = 8;
