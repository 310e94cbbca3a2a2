use crate::artifacts::analyzer::reference_scan::CONTENT_ROOT;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// Directory that mounts as `/Game/` in package paths.
pub const CONTENT_DIR: &str = "Content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Required to load the asset (import table).
    Hard,
    /// Optional reference found in the package content.
    Soft,
    /// Only discoverable by string search in an unrecognised file.
    Searchable,
}

impl DependencyKind {
    pub fn weight(&self) -> f64 {
        match self {
            DependencyKind::Hard => 1.0,
            DependencyKind::Soft => 0.5,
            DependencyKind::Searchable => 0.25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Hard => "hard",
            DependencyKind::Soft => "soft",
            DependencyKind::Searchable => "searchable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDependency {
    /// File path of the asset holding the reference.
    pub source: String,
    /// Package path of the referenced asset (`/Game/...`).
    pub target: String,
    pub kind: DependencyKind,
    /// Set when the edge lies on a dependency cycle.
    pub circular: bool,
    pub weight: f64,
}

impl AssetDependency {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: DependencyKind) -> Self {
        AssetDependency {
            source: source.into(),
            target: target.into(),
            kind,
            circular: false,
            weight: kind.weight(),
        }
    }

    pub fn is_hard(&self) -> bool {
        self.kind == DependencyKind::Hard
    }
}

/// Package path of a file under a `Content` directory
///
/// `Content/Characters/Hero.uasset` becomes `/Game/Characters/Hero`.
pub fn package_path(file_path: &Path) -> Option<String> {
    let components = file_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>();

    let content_index = components.iter().rposition(|part| *part == CONTENT_DIR)?;
    let (file_name, dirs) = components[content_index + 1..].split_last()?;
    let stem = Path::new(file_name).file_stem()?.to_str()?;

    let mut package = CONTENT_ROOT.to_string();
    for dir in dirs {
        package.push_str(dir);
        package.push('/');
    }
    package.push_str(stem);

    Some(package)
}

/// Normalised `/`-separated form of a path, as used for dependency sources.
pub fn display_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
