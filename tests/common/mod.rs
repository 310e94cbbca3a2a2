#![allow(dead_code)]

pub mod command;
pub mod file;
pub mod package;

use assert_fs::TempDir;
use hoard::areas::repository::Repository;
use hoard::artifacts::integrity::alert::MemoryAlertSink;
use hoard::config::HoardConfig;
use rstest::fixture;
use std::sync::Arc;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

pub fn test_config() -> HoardConfig {
    HoardConfig::load_from(|key| match key {
        "HOARD_AUTHOR" => Some("fake_user".to_string()),
        "HOARD_PROJECT" => Some("arena".to_string()),
        _ => None,
    })
    .expect("Failed to build test config")
}

/// Open a repository in `dir` whose alerts land in the returned sink.
pub fn open_repository(dir: &TempDir) -> (Repository, Arc<MemoryAlertSink>) {
    let alerts = Arc::new(MemoryAlertSink::default());
    let repository = Repository::with_alerts(
        &dir.path().to_string_lossy(),
        Box::new(std::io::sink()),
        test_config(),
        alerts.clone(),
    )
    .expect("Failed to open repository");

    (repository, alerts)
}
