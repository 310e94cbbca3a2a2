use crate::artifacts::analyzer::package_header::TableSpan;
use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

/// Longest name entry accepted, including the trailing NUL.
pub const MAX_NAME_LEN: i32 = 1024;
const LEN_FIELD: usize = 4;
const HASH_FIELD: usize = 4;

/// Names of a package, by table position
///
/// Damaged entries keep their slot as `None` so import indices still line up
/// with the entries that did parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    entries: Vec<Option<String>>,
}

impl NameTable {
    /// Parse up to `span.count` entries starting at `span.offset`
    ///
    /// Never fails: an implausible length or a non-UTF-8 payload skips the
    /// entry, and running out of bytes ends the table early.
    pub fn parse(bytes: &[u8], span: TableSpan) -> Self {
        let mut entries = Vec::new();
        let mut cursor = span.offset;

        for index in 0..span.count {
            let Some(len_field) = bytes.get(cursor..cursor + LEN_FIELD) else {
                debug!(index, cursor, "name table truncated");
                break;
            };
            let len = LittleEndian::read_i32(len_field);
            cursor += LEN_FIELD;

            if len <= 0 || len > MAX_NAME_LEN {
                debug!(index, len, "skipping name entry with implausible length");
                entries.push(None);
                cursor += HASH_FIELD;
                continue;
            }

            let end = cursor + len as usize;
            let Some(payload) = bytes.get(cursor..end) else {
                debug!(index, cursor, len, "name table truncated");
                break;
            };
            cursor = end + HASH_FIELD;

            let payload = payload.strip_suffix(b"\0").unwrap_or(payload);
            match std::str::from_utf8(payload) {
                Ok(name) => entries.push(Some(name.to_string())),
                Err(_) => {
                    debug!(index, "skipping name entry with invalid utf-8");
                    entries.push(None);
                }
            }
        }

        NameTable { entries }
    }

    /// Name at table position `index`, if that entry parsed.
    pub fn get(&self, index: i32) -> Option<&str> {
        let index = usize::try_from(index).ok()?;
        self.entries.get(index)?.as_deref()
    }

    /// Successfully parsed names, in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| entry.as_deref())
    }

    pub fn skipped(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
