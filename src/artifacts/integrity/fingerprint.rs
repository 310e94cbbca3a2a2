//! Asset fingerprints
//!
//! A fingerprint is the baseline a verification compares against. Besides the
//! whole-content digest it keeps narrower digests so a mismatch can be
//! attributed to a region of the asset:
//!
//! - `metadata_hash`: the package header region (the whole summary up to
//!   `total_header_size`), or the first 44 bytes of files without a header
//! - `dependency_hash`: the sorted `(target, kind)` dependency list
//! - `blueprint_logic_hash`: the sorted name table, blueprints only

use crate::artifacts::analyzer::AssetAnalysis;
use crate::artifacts::analyzer::package_header::{HEADER_LEN, PackageSummary};
use crate::artifacts::objects::object_id::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub content_digest: ObjectId,
    pub metadata_hash: ObjectId,
    pub dependency_hash: ObjectId,
    pub blueprint_logic_hash: Option<ObjectId>,
    pub size: u64,
    /// Whether the package header parsed when the fingerprint was taken.
    pub structured: bool,
}

impl Fingerprint {
    pub fn compute(bytes: &[u8], analysis: &AssetAnalysis) -> Self {
        let info = &analysis.info;

        let dependencies = info
            .dependencies
            .iter()
            .map(|dependency| format!("{}\t{}", dependency.target, dependency.kind.as_str()))
            .collect::<BTreeSet<_>>();
        let dependency_hash = ObjectId::digest_parts(
            dependencies
                .iter()
                .flat_map(|line| [line.as_bytes(), b"\n".as_slice()]),
        );

        let blueprint_logic_hash = info.is_blueprint.then(|| {
            let names = info.names.iter().map(String::as_str).collect::<BTreeSet<_>>();
            ObjectId::digest_parts(names.into_iter().flat_map(|name| [name.as_bytes(), b"\0".as_slice()]))
        });

        Fingerprint {
            content_digest: ObjectId::digest(bytes),
            metadata_hash: ObjectId::digest(metadata_region(bytes, info.header.as_ref())),
            dependency_hash,
            blueprint_logic_hash,
            size: bytes.len() as u64,
            structured: analysis.is_complete() && info.header.is_some(),
        }
    }
}

fn metadata_region<'a>(bytes: &'a [u8], header: Option<&PackageSummary>) -> &'a [u8] {
    let end = match header {
        Some(summary) => usize::try_from(summary.total_header_size)
            .unwrap_or(0)
            .clamp(HEADER_LEN, bytes.len().max(HEADER_LEN)),
        None => HEADER_LEN,
    };
    &bytes[..end.min(bytes.len())]
}
