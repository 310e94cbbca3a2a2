//! Blob object
//!
//! Blobs hold raw asset bytes. They carry no path or mode; those live in tree
//! entries. A blob's ID is the SHA-256 of its raw content, so two identical
//! payloads always collapse to one stored object.

use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

/// Number of bytes shown by `display` before truncating binary content.
const DISPLAY_PREVIEW_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

impl Packable for Blob {
    fn payload(&self) -> anyhow::Result<Bytes> {
        Ok(self.content.clone())
    }
}

impl Unpackable for Blob {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;

        Ok(Self::new(content.into()))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }

    fn display(&self) -> String {
        match std::str::from_utf8(&self.content) {
            Ok(text) => text.to_string(),
            Err(_) => {
                let preview = &self.content[..self.content.len().min(DISPLAY_PREVIEW_LEN)];
                let hex = preview
                    .iter()
                    .map(|byte| format!("{byte:02x}"))
                    .collect::<String>();
                format!("<binary {} bytes> {}", self.content.len(), hex)
            }
        }
    }

    fn object_id(&self) -> anyhow::Result<ObjectId> {
        Ok(ObjectId::digest(&self.content))
    }
}
