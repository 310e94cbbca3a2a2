mod common;

use common::package::PackageBuilder;
use hoard::artifacts::analyzer::asset_type::AssetType;
use hoard::artifacts::analyzer::blueprint::BlueprintSubtype;
use hoard::artifacts::analyzer::dependency::DependencyKind;
use hoard::artifacts::analyzer::dependency_graph::DependencyGraph;
use hoard::artifacts::analyzer::{analyze, analyze_or_scan};
use hoard::artifacts::integrity::health::{Criticality, IntegrityPolicy};
use hoard::errors::AnalyzerError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::Path;

fn with_imports(builder: PackageBuilder, count: usize) -> PackageBuilder {
    (0..count).fold(builder, |builder, i| builder.import(&format!("/Game/Props/SM_Crate_{i:02}")))
}

#[test]
fn many_imports_make_an_asset_high_criticality() {
    let bytes = with_imports(PackageBuilder::default().name("StaticMesh"), 12).build();

    let info = analyze(Path::new("Content/Levels/Warehouse.uasset"), &bytes).unwrap();

    assert_eq!(info.dependencies.len(), 12);
    assert!(info.dependencies.iter().all(|dependency| dependency.kind == DependencyKind::Hard));
    assert_eq!(info.dependencies[0].target, "/Game/Props/SM_Crate_00");
    assert_eq!(info.asset_type, AssetType::StaticMesh);
    assert!(!info.is_blueprint);
    assert_eq!(IntegrityPolicy::default().criticality(&info), Criticality::High);
}

#[test]
fn game_mode_blueprint_is_critical() {
    let bytes = with_imports(
        PackageBuilder::default()
            .name("BlueprintGeneratedClass")
            .name("BP_ArenaGameMode_C"),
        12,
    )
    .build();

    let info = analyze(Path::new("Content/Core/BP_ArenaGameMode.uasset"), &bytes).unwrap();

    assert!(info.is_blueprint);
    assert!(info.gameplay_critical);
    assert_eq!(info.asset_type, AssetType::Blueprint);
    assert_eq!(info.blueprint_subtype, Some(BlueprintSubtype::GameMode));
    assert_eq!(IntegrityPolicy::default().criticality(&info), Criticality::Critical);
    assert!(info.complexity_score > 12.0 * 2.0);
}

#[rstest]
#[case(0, Criticality::Low)]
#[case(6, Criticality::Medium)]
#[case(11, Criticality::High)]
fn criticality_follows_dependency_count(#[case] imports: usize, #[case] expected: Criticality) {
    let bytes = with_imports(PackageBuilder::default().name("Texture2D"), imports).build();

    let info = analyze(Path::new("Content/Textures/T_Atlas.uasset"), &bytes).unwrap();

    assert_eq!(info.dependencies.len(), imports);
    assert_eq!(IntegrityPolicy::default().criticality(&info), expected);
}

#[test]
fn name_table_past_the_end_is_an_error() {
    let bytes = PackageBuilder::default().name("Material").name_offset(1 << 20).build();

    let result = analyze(Path::new("Content/Materials/M_Rock.uasset"), &bytes);

    assert!(matches!(result, Err(AnalyzerError::TableOutOfBounds { table: "name", .. })));
}

#[test]
fn wrong_magic_falls_back_to_the_content_scan() {
    let mut bytes = PackageBuilder::default().name("Material").build();
    bytes[..4].copy_from_slice(b"JUNK");

    let analysis = analyze_or_scan(Path::new("Content/Materials/M_Rock.uasset"), &bytes);

    assert!(matches!(analysis.error, Some(AnalyzerError::InvalidHeader { .. })));
    assert!(analysis.info.dependencies.is_empty());
    assert_eq!(analysis.info.header, None);
}

#[test]
fn config_files_yield_searchable_references() {
    let bytes = b"[/Script/Engine.GameMapsSettings]\nGameDefaultMap=/Game/Maps/Arena.Arena\n";

    let info = analyze(Path::new("Config/DefaultEngine.ini"), bytes).unwrap();

    let targets = info
        .dependencies
        .iter()
        .map(|dependency| (dependency.target.as_str(), dependency.kind))
        .collect::<Vec<_>>();
    assert_eq!(targets, vec![("/Game/Maps/Arena", DependencyKind::Searchable)]);
    assert_eq!(info.asset_type, AssetType::Other);
}

#[test]
fn mutual_imports_are_reported_as_a_cycle() {
    let door = PackageBuilder::default().name("StaticMesh").import("/Game/Props/Frame").build();
    let frame = PackageBuilder::default().name("StaticMesh").import("/Game/Props/Door").build();
    let lamp = PackageBuilder::default().name("StaticMesh").import("/Game/Props/Door").build();

    let graph = DependencyGraph::build([
        analyze(Path::new("Content/Props/Door.uasset"), &door).unwrap(),
        analyze(Path::new("Content/Props/Frame.uasset"), &frame).unwrap(),
        analyze(Path::new("Content/Props/Lamp.uasset"), &lamp).unwrap(),
    ]);

    assert!(graph.has_cycles());
    assert_eq!(graph.cycles().len(), 1);
    let mut cycle = graph.cycles()[0].clone();
    cycle.sort();
    assert_eq!(cycle, vec!["Content/Props/Door.uasset".to_string(), "Content/Props/Frame.uasset".to_string()]);

    let mut dependents = graph.dependents_of("Content/Props/Door.uasset");
    dependents.sort();
    assert_eq!(dependents, vec!["Content/Props/Frame.uasset", "Content/Props/Lamp.uasset"]);
}
