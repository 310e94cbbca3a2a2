//! Tree object
//!
//! A tree is a flat, path-sorted snapshot of `path -> content digest` at one
//! commit. Entries are kept in a `BTreeMap` keyed by path, so the serialized
//! form is canonical no matter what order the caller supplied the files in.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <kind> <size> <path>\0<32-byte digest>`

use crate::artifacts::objects::entry_mode::{EntryKind, EntryMode};
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::GraphError;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// One file in a tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct TreeEntry {
    pub path: String,
    pub oid: ObjectId,
    pub size: u64,
    pub mode: EntryMode,
    pub kind: EntryKind,
}

impl TreeEntry {
    /// Whether two entries carry the same content.
    pub fn same_content(&self, other: &TreeEntry) -> bool {
        self.oid == other.oid
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from entries in any order
    ///
    /// Paths must be relative, `/`-separated and free of `.`/`..` segments.
    /// A path that appears twice is rejected instead of silently overwritten.
    pub fn build(entries: impl IntoIterator<Item = TreeEntry>) -> Result<Self, GraphError> {
        let mut tree = Self::default();

        for entry in entries {
            Self::validate_path(&entry.path)?;

            if tree.entries.contains_key(&entry.path) {
                return Err(GraphError::DuplicatePath(entry.path));
            }
            tree.entries.insert(entry.path.clone(), entry);
        }

        Ok(tree)
    }

    fn validate_path(path: &str) -> Result<(), GraphError> {
        let invalid = path.is_empty()
            || path.starts_with('/')
            || path.ends_with('/')
            || path.contains('\0')
            || path.contains('\\')
            || path
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..");

        if invalid {
            Err(GraphError::InvalidPath(path.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, TreeEntry)> {
        self.entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Packable for Tree {
    fn payload(&self) -> anyhow::Result<Bytes> {
        let mut content = Vec::new();

        for entry in self.entries.values() {
            write!(
                content,
                "{:o} {} {} {}\0",
                entry.mode.as_u32(),
                entry.kind.as_str(),
                entry.size,
                entry.path
            )?;
            entry.oid.write_binary_to(&mut content)?;
        }

        Ok(Bytes::from(content))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();

        // reuse scratch buffers across entries
        let mut field = Vec::new();
        let mut path_buf = Vec::new();

        loop {
            field.clear();
            let n = reader.read_until(b' ', &mut field)?;
            if n == 0 {
                break;
            }
            let mode = EntryMode::from_octal_str(read_field(&mut field, b' ', "mode")?)?;

            field.clear();
            reader.read_until(b' ', &mut field)?;
            let kind = EntryKind::try_from(read_field(&mut field, b' ', "kind")?)?;

            field.clear();
            reader.read_until(b' ', &mut field)?;
            let size = read_field(&mut field, b' ', "size")?.parse::<u64>()?;

            path_buf.clear();
            reader.read_until(b'\0', &mut path_buf)?;
            let path = read_field(&mut path_buf, b'\0', "path")?.to_owned();

            let oid = ObjectId::read_binary_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(path.clone(), TreeEntry::new(path, oid, size, mode, kind));
        }

        Ok(Tree { entries })
    }
}

fn read_field<'b>(buffer: &'b mut Vec<u8>, delimiter: u8, name: &str) -> anyhow::Result<&'b str> {
    if buffer.last() != Some(&delimiter) {
        anyhow::bail!("unexpected EOF in {name}");
    }
    buffer.pop();
    Ok(std::str::from_utf8(buffer)?)
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .values()
            .map(|entry| {
                format!(
                    "{} {} {} {:>10}\t{}",
                    entry.mode.as_str(),
                    entry.kind.as_str(),
                    entry.oid,
                    entry.size,
                    entry.path
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}
