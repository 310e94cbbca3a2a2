mod common;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use common::command::{branch_head, hoard_commit, init_repository_dir, run_hoard_command};
use common::file::{FileSpec, write_file, write_generated_files};
use common::package::PackageBuilder;
use common::repository_dir;
use predicates::prelude::*;
use rstest::rstest;

#[rstest]
fn init_creates_the_repository_layout(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Initialized empty hoard repository in"));

    for dir in ["objects", "uploads", "integrity", "refs/arena/heads"] {
        repository_dir
            .child(".hoard")
            .child(dir)
            .assert(predicate::path::is_dir());
    }

    Ok(())
}

#[rstest]
fn first_commit_is_a_root_commit(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(repository_dir.path(), &["init"]).assert().success();
    write_generated_files(repository_dir.path(), 3);

    hoard_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\[main \(root-commit\) [0-9a-f]{8}\] Initial commit\n$")?);

    Ok(())
}

#[rstest]
fn commit_requires_an_author(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(init_repository_dir.path(), &["commit", "-m", "anonymous"])
        .env_remove("HOARD_AUTHOR")
        .assert()
        .failure()
        .stderr(predicate::str::contains("HOARD_AUTHOR not set"));

    Ok(())
}

#[rstest]
fn hash_object_writes_blobs_readable_by_cat_file(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    write_file(FileSpec::new(
        init_repository_dir.path().join("notes.txt"),
        "remember the lightmaps".to_string(),
    ));

    let output = run_hoard_command(init_repository_dir.path(), &["hash-object", "-w", "notes.txt"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let oid = String::from_utf8(output)?.trim().to_string();
    assert_eq!(oid.len(), 64);

    run_hoard_command(init_repository_dir.path(), &["cat-file", "-p", &oid])
        .assert()
        .success()
        .stdout(predicate::str::contains("remember the lightmaps"));

    Ok(())
}

#[rstest]
fn ls_tree_lists_committed_files(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(init_repository_dir.path(), &["ls-tree", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.txt").and(predicate::str::contains("Content/2.txt")));

    Ok(())
}

#[rstest]
fn log_lists_commits_newest_first(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    write_file(FileSpec::new(
        init_repository_dir.path().join("1.txt"),
        "changed".to_string(),
    ));
    run_hoard_command(init_repository_dir.path(), &["commit", "-m", "Second commit"])
        .env("HOARD_DATE", "2023-01-02 12:00:00 +0000")
        .assert()
        .success();

    run_hoard_command(init_repository_dir.path(), &["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^[0-9a-f]{8} \(main\) Second commit\n[0-9a-f]{8} Initial commit\n$",
        )?);

    run_hoard_command(init_repository_dir.path(), &["log", "-n", "1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Author: fake_user")
                .and(predicate::str::contains("Date:   Mon Jan 2 12:00:00 2023 +0000"))
                .and(predicate::str::contains("Initial commit").not()),
        );

    Ok(())
}

#[rstest]
fn diff_between_branches_shows_name_status(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(init_repository_dir.path(), &["branch", "create", "baseline"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Created branch baseline at "));

    write_file(FileSpec::new(
        init_repository_dir.path().join("1.txt"),
        "uno".to_string(),
    ));
    std::fs::remove_file(init_repository_dir.path().join("Content").join("2.txt"))?;
    write_file(FileSpec::new(
        init_repository_dir.path().join("3.txt"),
        "three".to_string(),
    ));
    hoard_commit(init_repository_dir.path(), "Rework").assert().success();

    run_hoard_command(init_repository_dir.path(), &["diff", "baseline", "main"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^M\t1\.txt\t[0-9a-f]{8}\.\.[0-9a-f]{8}\nA\t3\.txt\t-{8}\.\.[0-9a-f]{8}\nD\tContent/2\.txt\t[0-9a-f]{8}\.\.-{8}\n$",
        )?);

    run_hoard_command(
        init_repository_dir.path(),
        &["diff", "baseline", "main", "--diff-filter", "A"],
    )
    .assert()
    .success()
    .stdout(predicate::str::contains("3.txt").and(predicate::str::contains("1.txt").not()));

    Ok(())
}

#[rstest]
fn branches_are_listed_and_deleted(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let head = branch_head(init_repository_dir.path(), "main");
    run_hoard_command(init_repository_dir.path(), &["branch", "create", "feature/lighting", &head])
        .assert()
        .success();

    run_hoard_command(init_repository_dir.path(), &["branch", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("  feature/lighting").and(predicate::str::contains("* main")));

    run_hoard_command(init_repository_dir.path(), &["branch", "delete", "main"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot delete the current branch"));

    run_hoard_command(init_repository_dir.path(), &["branch", "delete", "feature/lighting"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Deleted branch feature/lighting (was {})",
            &head[..8]
        )));

    Ok(())
}

#[rstest]
fn analyze_reports_dependencies_and_cycles(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(repository_dir.path(), &["init"]).assert().success();
    repository_dir
        .child("Content/Props/Door.uasset")
        .write_binary(&PackageBuilder::default().name("StaticMesh").import("/Game/Props/Frame").build())?;
    repository_dir
        .child("Content/Props/Frame.uasset")
        .write_binary(&PackageBuilder::default().name("StaticMesh").import("/Game/Props/Door").build())?;

    run_hoard_command(repository_dir.path(), &["analyze"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Content/Props/Door.uasset")
                .and(predicate::str::contains("type:        static_mesh"))
                .and(predicate::str::contains("hard       /Game/Props/Frame (circular)"))
                .and(predicate::str::contains(
                    "cycle: Content/Props/Door.uasset -> Content/Props/Frame.uasset",
                )),
        );

    run_hoard_command(repository_dir.path(), &["analyze", "Content/Props/Door.uasset", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""asset_type": "static_mesh""#));

    Ok(())
}

#[rstest]
fn verify_recovers_a_damaged_asset(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    run_hoard_command(dir, &["track", "1.txt"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("tracking 1.txt"));

    write_file(FileSpec::new(dir.join("1.txt"), "0ne".to_string()));
    run_hoard_command(dir, &["verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recovered (restored_from_backup) 1.txt"));

    init_repository_dir.child("1.txt").assert("one");

    run_hoard_command(dir, &["verify", "1.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok 1.txt"));

    Ok(())
}

#[rstest]
fn verify_fails_for_a_missing_asset(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir.path();
    run_hoard_command(dir, &["track", "Content/2.txt"]).assert().success();
    std::fs::remove_file(dir.join("Content").join("2.txt"))?;

    run_hoard_command(dir, &["verify"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("missing from the working copy"))
        .stderr(predicate::str::contains("1 of 1 assets need attention"));

    run_hoard_command(dir, &["restore", "Content/2.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("restored Content/2.txt from backup"));
    init_repository_dir.child("Content/2.txt").assert("two");

    Ok(())
}

#[rstest]
fn gc_keeps_committed_objects(init_repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_hoard_command(init_repository_dir.path(), &["gc", "--grace-secs", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 0 (0 bytes), kept 4"));

    run_hoard_command(init_repository_dir.path(), &["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initial commit"));

    Ok(())
}
