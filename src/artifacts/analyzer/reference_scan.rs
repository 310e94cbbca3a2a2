use regex::bytes::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::warn;

/// Mount point of project content inside package paths.
pub const CONTENT_ROOT: &str = "/Game/";

/// File suffixes that mark a string as an asset reference.
pub const ASSET_SUFFIXES: [&str; 2] = [".uasset", ".umap"];

pub const SOFT_REFERENCE_REGEX: &str = r"/Game/[A-Za-z0-9_./-]+";

static SOFT_REFERENCE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(SOFT_REFERENCE_REGEX));

/// Reduce an asset-looking string to its package path
///
/// `/Game/Hero/BP_Hero.BP_Hero_C` and `/Game/Hero/BP_Hero.uasset` both become
/// `/Game/Hero/BP_Hero`. Returns `None` for strings that do not name an asset.
pub fn normalize_reference(name: &str) -> Option<String> {
    let name = name.trim_end_matches('\0').trim();
    let lowercase = name.to_ascii_lowercase();

    let path = match name.find(CONTENT_ROOT) {
        Some(start) => &name[start..],
        None if ASSET_SUFFIXES.iter().any(|suffix| lowercase.ends_with(suffix)) => name,
        None => return None,
    };

    let path = ASSET_SUFFIXES
        .iter()
        .find_map(|suffix| {
            path.len()
                .checked_sub(suffix.len())
                .filter(|&cut| path.is_char_boundary(cut) && path[cut..].eq_ignore_ascii_case(suffix))
                .map(|cut| &path[..cut])
        })
        .unwrap_or(path);

    // `Package.Object` names collapse to the package
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    let path = match path[segment_start..].find('.') {
        Some(dot) => &path[..segment_start + dot],
        None => path,
    };
    let path = path.trim_end_matches('/');

    if path.is_empty() || path == CONTENT_ROOT.trim_end_matches('/') {
        return None;
    }
    Some(path.to_string())
}

/// Every distinct content path mentioned anywhere in `bytes`, sorted.
pub fn scan_references(bytes: &[u8]) -> Vec<String> {
    let regex = match &*SOFT_REFERENCE {
        Ok(regex) => regex,
        Err(e) => {
            warn!(error = %e, "soft reference pattern failed to compile");
            return Vec::new();
        }
    };

    regex
        .find_iter(bytes)
        .filter_map(|m| std::str::from_utf8(m.as_bytes()).ok())
        .filter_map(normalize_reference)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
