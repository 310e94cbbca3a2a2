//! Binary asset analyzer
//!
//! Pure functions of `(path, bytes)` that extract what the rest of the
//! repository needs from an engine package:
//!
//! - `asset_type`: extension dispatch and asset classification
//! - `package_header`: the fixed summary header and its table bounds
//! - `name_table` / `import_table`: hard dependencies from the import table
//! - `reference_scan`: soft references found anywhere in the content
//! - `blueprint`: script-bearing asset detection
//! - `dependency_graph`: cross-asset cycles and reverse lookups
//!
//! ## Failure policy
//!
//! A header that does not parse is an error for the whole asset; callers that
//! still want the soft references use [`analyze_or_scan`]. Damage inside the
//! name or import tables only shrinks the result.

pub mod asset_type;
pub mod blueprint;
pub mod dependency;
pub mod dependency_graph;
#[cfg(test)]
pub(crate) mod fixture;
pub mod import_table;
pub mod name_table;
pub mod package_header;
pub mod reference_scan;

use crate::artifacts::analyzer::asset_type::{AssetFormat, AssetType};
use crate::artifacts::analyzer::blueprint::{BlueprintInfo, BlueprintSubtype};
use crate::artifacts::analyzer::dependency::{AssetDependency, DependencyKind, display_path, package_path};
use crate::artifacts::analyzer::import_table::{ImportRecord, parse_imports};
use crate::artifacts::analyzer::name_table::NameTable;
use crate::artifacts::analyzer::package_header::PackageSummary;
use crate::artifacts::analyzer::reference_scan::scan_references;
use crate::errors::AnalyzerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

const DEPENDENCY_WEIGHT: f64 = 1.0;
const HARD_DEPENDENCY_WEIGHT: f64 = 2.0;
const BLUEPRINT_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub path: String,
    pub asset_type: AssetType,
    pub format: AssetFormat,
    pub is_blueprint: bool,
    pub blueprint_subtype: Option<BlueprintSubtype>,
    /// Blueprint mentioning a gameplay-critical class (game mode, pawn, ...).
    pub gameplay_critical: bool,
    pub names: Vec<String>,
    pub dependencies: Vec<AssetDependency>,
    pub complexity_score: f64,
    pub header: Option<PackageSummary>,
}

impl AssetInfo {
    pub fn hard_dependencies(&self) -> impl Iterator<Item = &AssetDependency> {
        self.dependencies.iter().filter(|dependency| dependency.is_hard())
    }

    /// Dependency targets, sorted and deduplicated.
    pub fn dependency_targets(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .map(|dependency| dependency.target.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Package path of this asset, when it lives under a `Content` directory.
    pub fn package_path(&self) -> Option<String> {
        package_path(Path::new(&self.path))
    }
}

/// Result of [`analyze_or_scan`]: always an [`AssetInfo`], plus the header
/// error when only the content scan could run.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetAnalysis {
    pub info: AssetInfo,
    pub error: Option<AnalyzerError>,
}

impl AssetAnalysis {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Analyze one file
///
/// Header-bearing formats must carry a valid package header; every other
/// format only gets the reference scan.
pub fn analyze(path: &Path, bytes: &[u8]) -> Result<AssetInfo, AnalyzerError> {
    let format = AssetFormat::from_path(path);
    if !format.has_header() {
        return Ok(scan_only(path, format, bytes));
    }

    let header = PackageSummary::parse(bytes)?;
    let names = NameTable::parse(bytes, header.names(bytes.len())?);
    let imports = parse_imports(bytes, header.imports(bytes.len())?, &names);
    if names.skipped() > 0 {
        debug!(path = %path.display(), skipped = names.skipped(), "name table partially damaged");
    }

    let source = display_path(path);
    let own_package = package_path(path);
    let hard = imports
        .iter()
        .filter_map(ImportRecord::asset_reference)
        .filter(|target| Some(target) != own_package.as_ref())
        .collect::<BTreeSet<_>>();
    let soft = scan_references(bytes)
        .into_iter()
        .filter(|target| !hard.contains(target) && Some(target) != own_package.as_ref())
        .collect::<Vec<_>>();

    let dependencies = hard
        .into_iter()
        .map(|target| AssetDependency::new(source.clone(), target, DependencyKind::Hard))
        .chain(
            soft.into_iter()
                .map(|target| AssetDependency::new(source.clone(), target, DependencyKind::Soft)),
        )
        .collect::<Vec<_>>();

    let names = names.names().map(str::to_string).collect::<Vec<_>>();
    let blueprint = blueprint::detect(names.iter().map(String::as_str), bytes);

    Ok(assemble(path, format, names, dependencies, blueprint, Some(header)))
}

/// Analyze, falling back to the reference scan when the header is unusable.
pub fn analyze_or_scan(path: &Path, bytes: &[u8]) -> AssetAnalysis {
    match analyze(path, bytes) {
        Ok(info) => AssetAnalysis { info, error: None },
        Err(error) => {
            warn!(path = %path.display(), %error, "package header unusable, scanning content only");
            AssetAnalysis {
                info: scan_only(path, AssetFormat::from_path(path), bytes),
                error: Some(error),
            }
        }
    }
}

fn scan_only(path: &Path, format: AssetFormat, bytes: &[u8]) -> AssetInfo {
    let source = display_path(path);
    let own_package = package_path(path);
    let kind = if format.is_recognized() {
        DependencyKind::Soft
    } else {
        DependencyKind::Searchable
    };

    let dependencies = scan_references(bytes)
        .into_iter()
        .filter(|target| Some(target) != own_package.as_ref())
        .map(|target| AssetDependency::new(source.clone(), target, kind))
        .collect::<Vec<_>>();
    let blueprint = blueprint::detect(std::iter::empty(), bytes);

    assemble(path, format, Vec::new(), dependencies, blueprint, None)
}

fn assemble(
    path: &Path,
    format: AssetFormat,
    names: Vec<String>,
    dependencies: Vec<AssetDependency>,
    blueprint: Option<BlueprintInfo>,
    header: Option<PackageSummary>,
) -> AssetInfo {
    let asset_type = AssetType::classify(format, path, &names, blueprint.is_some());
    let complexity_score = complexity(&dependencies, blueprint.is_some(), asset_type);

    AssetInfo {
        path: display_path(path),
        asset_type,
        format,
        is_blueprint: blueprint.is_some(),
        blueprint_subtype: blueprint.map(|info| info.subtype),
        gameplay_critical: blueprint.is_some_and(|info| info.gameplay_critical),
        names,
        dependencies,
        complexity_score,
        header,
    }
}

/// Weighted size of an asset's dependency surface.
pub fn complexity(dependencies: &[AssetDependency], is_blueprint: bool, asset_type: AssetType) -> f64 {
    let hard = dependencies.iter().filter(|dependency| dependency.is_hard()).count();
    let blueprint = if is_blueprint { BLUEPRINT_WEIGHT } else { 0.0 };

    DEPENDENCY_WEIGHT * dependencies.len() as f64
        + HARD_DEPENDENCY_WEIGHT * hard as f64
        + blueprint
        + asset_type.category_bonus()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::analyzer::fixture::PackageFixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn wrong_magic_fails_without_dependencies() {
        let mut bytes = PackageFixture::default()
            .with_names(["/Game/Props/SM_Crate"])
            .build();
        bytes[..4].copy_from_slice(&[0, 0, 0, 0]);

        let result = analyze(Path::new("Content/Props/Crate.uasset"), &bytes);
        assert!(matches!(result, Err(AnalyzerError::InvalidHeader { .. })));
    }

    #[test]
    fn corrupted_name_entry_keeps_remaining_names() {
        let bytes = PackageFixture::default()
            .with_names(["StaticMesh"])
            .with_raw_name(4, &[0xc3, 0x28, 0xa0, 0x00])
            .with_names(["/Game/Materials/M_Rock", "Default__StaticMesh"])
            .build();

        let info = analyze(Path::new("Content/Props/Rock.uasset"), &bytes).unwrap();

        assert_eq!(
            info.names,
            vec!["StaticMesh", "/Game/Materials/M_Rock", "Default__StaticMesh"]
        );
        assert_eq!(info.asset_type, AssetType::StaticMesh);
    }

    #[test]
    fn names_offset_past_the_end_is_an_error() {
        let bytes = PackageFixture::default()
            .with_names(["Hero"])
            .with_name_offset(i32::MAX)
            .build();

        let result = analyze(Path::new("Content/Hero.uasset"), &bytes);
        assert!(matches!(
            result,
            Err(AnalyzerError::TableOutOfBounds { table: "name", .. })
        ));
    }

    #[test]
    fn imports_are_hard_and_scanned_paths_are_soft() {
        let bytes = PackageFixture::default()
            .with_names([
                "/Script/CoreUObject",
                "Package",
                "/Game/Materials/M_Rock",
                "/Game/Props/Rock",
            ])
            .with_import(0, 1, 2)
            .with_trailer(b"\0\0/Game/FX/P_Dust.P_Dust\0/Game/Materials/M_Rock.M_Rock\0")
            .build();

        let info = analyze(Path::new("Content/Props/Rock.uasset"), &bytes).unwrap();
        let deps = info
            .dependencies
            .iter()
            .map(|dependency| (dependency.target.as_str(), dependency.kind))
            .collect::<Vec<_>>();

        // the package's own path is not a dependency
        assert_eq!(
            deps,
            vec![
                ("/Game/Materials/M_Rock", DependencyKind::Hard),
                ("/Game/FX/P_Dust", DependencyKind::Soft),
            ]
        );
        assert_eq!(info.complexity_score, 2.0 + 2.0);
    }

    #[test]
    fn unrecognized_files_yield_searchable_references() {
        let info = analyze(Path::new("Config/DefaultGame.ini"), b"GameDefaultMap=/Game/Maps/Arena.Arena").unwrap();

        assert_eq!(info.asset_type, AssetType::Other);
        assert_eq!(info.dependencies.len(), 1);
        assert_eq!(info.dependencies[0].kind, DependencyKind::Searchable);
        assert_eq!(info.dependencies[0].weight, 0.25);
    }

    #[test]
    fn header_failure_falls_back_to_scan() {
        let analysis = analyze_or_scan(Path::new("Content/Maps/Arena.umap"), b"garbage /Game/Props/Rock");

        assert!(!analysis.is_complete());
        assert_eq!(analysis.info.asset_type, AssetType::Level);
        assert_eq!(analysis.info.dependencies[0].kind, DependencyKind::Soft);
        assert_eq!(analysis.info.complexity_score, 1.0 + 20.0);
    }

    #[test]
    fn blueprint_complexity_includes_its_weight() {
        let bytes = PackageFixture::default()
            .with_names(["BlueprintGeneratedClass", "BP_Door_C", "Actor"])
            .build();

        let info = analyze(Path::new("Content/BP_Door.uasset"), &bytes).unwrap();

        assert!(info.is_blueprint);
        assert_eq!(info.asset_type, AssetType::Blueprint);
        assert_eq!(info.blueprint_subtype, Some(BlueprintSubtype::Actor));
        assert_eq!(info.complexity_score, 10.0);
    }
}
