use crate::common::file::{FileSpec, write_file};
use crate::common::repository_dir;
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_hoard_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("Content").join("2.txt"),
        "two".to_string(),
    ));

    hoard_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_hoard_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("hoard").expect("Failed to find hoard binary");
    cmd.env_remove("HOARD_BRANCH");
    cmd.envs(vec![
        ("HOARD_PROJECT", "arena"),
        ("HOARD_AUTHOR", "fake_user"),
        ("NO_COLOR", "1"),
    ]);
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn hoard_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_hoard_command(dir, &["commit", "-m", message]);
    cmd.env("HOARD_DATE", "2023-01-01 12:00:00 +0000"); // %Y-%m-%d %H:%M:%S %z
    cmd
}

/// Full id of the head of `branch` in the `arena` project.
pub fn branch_head(dir: &Path, branch: &str) -> String {
    let path = dir
        .join(".hoard")
        .join("refs")
        .join("arena")
        .join("heads")
        .join(branch);
    std::fs::read_to_string(path)
        .expect("Failed to read branch ref")
        .trim()
        .to_string()
}
