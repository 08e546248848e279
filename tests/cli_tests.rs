//! CLI integration tests using the REAL sideload binary

mod common;

use assert_cmd::Command;
use common::TestHome;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

#[allow(deprecated)]
fn sideload_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sideload").unwrap();
    cmd.env("SIDELOAD_HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_output() {
    let home = TestHome::new();
    sideload_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("clean-orphans"))
        .stdout(predicate::str::contains("migrate-app-group"));
}

#[test]
fn test_version_output() {
    let home = TestHome::new();
    sideload_cmd(home.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sideload"))
        .stdout(predicate::str::contains(home.path().display().to_string()))
        .stdout(predicate::str::contains("Signer:  none"));
}

#[test]
fn test_list_empty_home() {
    let home = TestHome::new();
    sideload_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No apps installed."));
}

#[test]
fn test_install_list_hide_and_remove() {
    let home = TestHome::new();
    let archive = home.archive("game.ipa", "com.example.game", "v1");

    sideload_cmd(home.path())
        .arg("install")
        .arg(&archive)
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.game.app"));
    assert!(home.path().join("Bundles/com.example.game.app/App").is_file());

    sideload_cmd(home.path())
        .args(["hide", "com.example.game.app"])
        .assert()
        .success();
    sideload_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 hidden app(s)"));
    sideload_cmd(home.path())
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Identifier:"))
        .stdout(predicate::str::contains("hidden"));

    sideload_cmd(home.path())
        .args(["remove", "com.example.game.app", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    assert!(!home.path().join("Bundles/com.example.game.app").exists());
}

#[test]
fn test_install_conflict_policies() {
    let home = TestHome::new();
    let archive = home.archive("game.ipa", "com.example.game", "v1");

    sideload_cmd(home.path()).arg("install").arg(&archive).assert().success();

    sideload_cmd(home.path())
        .arg("install")
        .arg(&archive)
        .args(["--on-conflict", "cancel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Install cancelled"));

    sideload_cmd(home.path())
        .arg("install")
        .arg(&archive)
        .args(["--on-conflict", "new"])
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.game_"));
}

#[test]
fn test_install_missing_archive_fails() {
    let home = TestHome::new();
    sideload_cmd(home.path())
        .args(["install", "does-not-exist.ipa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Failed to extract archive"));
}

#[test]
fn test_failing_signer_reports_resign_hint() {
    let home = TestHome::new();
    fs::write(
        home.path().join("sideload.yaml"),
        "signer:\n  command: sideload-test-missing-signer\n",
    )
    .unwrap();
    let archive = home.archive("game.ipa", "com.example.game", "v1");

    sideload_cmd(home.path())
        .arg("install")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Signing failed for 'com.example.game.app'"));

    sideload_cmd(home.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("not in the catalog"))
        .stdout(predicate::str::contains("sideload resign com.example.game.app"));
}

#[test]
fn test_clean_orphans_with_yes() {
    let home = TestHome::new();
    home.folder(&home.layout.private_data_root, "ORPHAN");

    sideload_cmd(home.path())
        .args(["clean-orphans", "-y"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 orphaned data folder(s)."));
    assert!(!home.layout.private_data_root.join("ORPHAN").exists());

    sideload_cmd(home.path())
        .arg("clean-orphans")
        .assert()
        .success()
        .stdout(predicate::str::contains("No orphaned data folders."));
}

#[test]
fn test_migrate_app_group_conflict_exits_with_error() {
    let home = TestHome::new();
    home.folder(&home.layout.private_app_group_root, "group.a");
    home.folder(&home.layout.shared_app_group_root, "group.b");

    sideload_cmd(home.path())
        .args(["migrate-app-group", "--to", "shared"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not empty"));
    assert!(home.layout.private_app_group_root.join("group.a").exists());
}

#[test]
fn test_storage_report() {
    let home = TestHome::new();
    home.folder(&home.layout.private_data_root, "ORPHAN");

    sideload_cmd(home.path())
        .arg("storage")
        .assert()
        .success()
        .stdout(predicate::str::contains("private data"))
        .stdout(predicate::str::contains("1 orphaned data folder(s)"));
}

#[test]
fn test_lookup_by_scheme() {
    let home = TestHome::new();
    let archive = home.path().join("schemes.ipa");
    common::write_zip(
        &archive,
        &[(
            "Payload/App.app/Info.json",
            br#"{"CFBundleIdentifier": "com.example.links", "CFBundleURLTypes": [{"CFBundleURLSchemes": ["links"]}]}"#,
        )],
    );
    sideload_cmd(home.path()).arg("install").arg(&archive).assert().success();

    sideload_cmd(home.path())
        .args(["lookup", "links://"])
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.links.app"));
    sideload_cmd(home.path())
        .args(["lookup", "other"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No installed app handles 'other'"));
}

#[test]
fn test_home_flag_overrides_env() {
    let env_home = TestHome::new();
    let flag_home = TestHome::new();
    let archive = flag_home.archive("game.ipa", "com.example.game", "v1");

    sideload_cmd(env_home.path())
        .arg("--home")
        .arg(flag_home.path())
        .arg("install")
        .arg(&archive)
        .assert()
        .success();

    assert!(flag_home.path().join("Bundles/com.example.game.app").is_dir());
    assert!(!env_home.path().join("Bundles").exists());
}

#[test]
fn test_unknown_app_is_error() {
    let home = TestHome::new();
    sideload_cmd(home.path())
        .args(["lock", "nope.app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("App not found: nope.app"));
}
