use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use bytes::Bytes;
use std::io::{BufRead, Write};

pub trait Packable {
    /// Canonical payload bytes, without the `<type> <size>\0` header.
    fn payload(&self) -> Result<Bytes>;
}

pub trait Unpackable {
    /// Decode from the payload, the header having already been consumed.
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

pub trait Object: Packable {
    fn object_type(&self) -> ObjectType;

    fn display(&self) -> String;

    /// Framed form as written to disk: `<type> <size>\0<payload>`.
    fn serialize(&self) -> Result<Bytes> {
        let payload = self.payload()?;

        let mut framed = Vec::with_capacity(payload.len() + 16);
        write!(framed, "{} {}\0", self.object_type().as_str(), payload.len())?;
        framed.extend_from_slice(&payload);

        Ok(Bytes::from(framed))
    }

    /// Trees and commits hash their framed form; blobs override this to hash
    /// raw content so clients can compute digests without knowing the framing.
    fn object_id(&self) -> Result<ObjectId> {
        Ok(ObjectId::framed_digest(&self.serialize()?))
    }
}

pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn display(&self) -> String {
        match self {
            ObjectBox::Blob(blob) => blob.display(),
            ObjectBox::Tree(tree) => tree.display(),
            ObjectBox::Commit(commit) => commit.display(),
        }
    }
}
