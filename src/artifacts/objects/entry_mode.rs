use serde::{Deserialize, Serialize};

/// File mode recorded in a tree entry.
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    #[default]
    Regular,
    Executable,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::Regular => 0o100644,
            EntryMode::Executable => 0o100755,
        }
    }

    pub fn from_octal_str(s: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(s, 8)?;
        Self::try_from(mode)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::Regular),
            0o100755 => Ok(EntryMode::Executable),
            _ => Err(anyhow::anyhow!("invalid entry mode {mode:o}")),
        }
    }
}

/// What a tree entry points at.
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Opaque file content.
    #[default]
    Blob,
    /// Content with a recognised engine asset extension.
    Asset,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Asset => "asset",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(EntryKind::Blob),
            "asset" => Ok(EntryKind::Asset),
            _ => Err(anyhow::anyhow!("invalid entry kind {value:?}")),
        }
    }
}
