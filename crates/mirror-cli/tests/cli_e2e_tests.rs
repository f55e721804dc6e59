//! End-to-end tests for the pkg-mirror binary.
//!
//! These tests exercise the compiled binary using assert_cmd against
//! temporary local and remote roots.

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use mirror_test_utils::TestMirror;
use predicates::prelude::*;

const SETTINGS_ENV: [&str; 6] = [
    "TIER",
    "STORAGE_BACKEND",
    "BUCKET_NAME",
    "LOCAL_PACKAGE_DIRECTORY",
    "REMOTE_PACKAGE_DIRECTORY",
    "PKG_MIRROR_CONFIG",
];

/// Get a Command for the pkg-mirror binary with no ambient settings
fn mirror_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pkg-mirror"));
    for key in SETTINGS_ENV {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG");
    cmd
}

/// A command bound to both roots of `mirror`
fn mirror_cmd_for(mirror: &TestMirror) -> Command {
    let mut cmd = mirror_cmd();
    cmd.arg("--local-root")
        .arg(mirror.local_root())
        .arg("--remote-root")
        .arg(mirror.remote_root());
    cmd
}

// ============================================================================
// Help and completions
// ============================================================================

#[test]
fn test_help_output() {
    mirror_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package Mirror"));
}

#[test]
fn test_no_command_prints_hint() {
    mirror_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("pkg-mirror --help"));
}

#[test]
fn test_completions_bash() {
    mirror_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pkg-mirror"));
}

// ============================================================================
// describe
// ============================================================================

#[test]
fn test_describe_dev_defaults() {
    mirror_cmd()
        .arg("describe")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tier: dev"))
        .stdout(predicate::str::contains("Backend: local"))
        .stdout(predicate::str::contains("Local root: ./packages"));
}

#[test]
fn test_describe_reads_environment() {
    mirror_cmd()
        .env("TIER", "prod")
        .env("BUCKET_NAME", "package-mirror")
        .arg("describe")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend: object-store"))
        .stdout(predicate::str::contains("Bucket: package-mirror"));
}

#[test]
fn test_describe_flag_overrides_environment() {
    mirror_cmd()
        .env("LOCAL_PACKAGE_DIRECTORY", "/from/env")
        .args(["describe", "--local-root", "/from/flag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Local root: /from/flag"));
}

#[test]
fn test_describe_reports_missing_bucket() {
    mirror_cmd()
        .args(["describe", "--tier", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("requires a bucket"));
}

#[test]
fn test_describe_json() {
    let output = mirror_cmd()
        .args(["describe", "--json", "--tier", "prod"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["backend"], "object-store");
    assert_eq!(report["remote_root"], "packages");
    assert_eq!(report["valid"], false);
}

#[test]
fn test_describe_uses_settings_file() {
    let temp = TempDir::new().unwrap();
    let config = temp.child("mirror.yaml");
    config
        .write_str("local_root: /srv/packages\nremote_root: /srv/remote\n")
        .unwrap();

    mirror_cmd()
        .arg("describe")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Local root: /srv/packages"))
        .stdout(predicate::str::contains("Remote root: /srv/remote"));
}

#[test]
fn test_invalid_settings_file_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.child("mirror.ini");
    config.write_str("local_root=/srv").unwrap();

    mirror_cmd()
        .arg("describe")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// pull
// ============================================================================

#[test]
fn test_pull_copies_remote_files() {
    let mirror = TestMirror::new();
    mirror.write_remote("a-1.0.whl", "alpha");
    mirror.write_remote("b-2.0.tar.gz", "beta");

    mirror_cmd_for(&mirror)
        .arg("pull")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pulled 2 file(s)"));

    assert_eq!(mirror.read_local("a-1.0.whl"), "alpha");
    assert_eq!(mirror.read_local("b-2.0.tar.gz"), "beta");
}

#[test]
fn test_pull_fails_on_missing_remote_root() {
    let mirror = TestMirror::new();

    mirror_cmd()
        .arg("--local-root")
        .arg(mirror.local_root())
        .arg("--remote-root")
        .arg(mirror.root().join("missing"))
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote"));
}

#[test]
fn test_pull_object_store_backend_over_directory() {
    let mirror = TestMirror::new();
    mirror.write_remote("packages/a-1.0.whl", "alpha");

    mirror_cmd()
        .arg("--tier")
        .arg("prod")
        .arg("--local-root")
        .arg(mirror.local_root())
        .arg("--bucket")
        .arg(mirror.remote_root())
        .arg("pull")
        .assert()
        .success();

    assert_eq!(mirror.read_local("a-1.0.whl"), "alpha");
}

#[test]
fn test_pull_object_store_backend_rejects_missing_bucket_directory() {
    let mirror = TestMirror::new();

    mirror_cmd()
        .args(["--tier", "prod", "--local-root"])
        .arg(mirror.local_root())
        .arg("--bucket")
        .arg(mirror.root().join("no-such-bucket"))
        .arg("pull")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a directory"));
}

// ============================================================================
// run
// ============================================================================

#[cfg(unix)]
#[test]
fn test_run_mirrors_changes_made_by_child() {
    let mirror = TestMirror::new();
    mirror.write_remote("a.whl", "a");
    mirror.write_remote("b.whl", "b");

    mirror_cmd_for(&mirror)
        .args([
            "run",
            "--",
            "sh",
            "-c",
            "rm \"$PKG_MIRROR_LOCAL_ROOT/a.whl\" && echo c > \"$PKG_MIRROR_LOCAL_ROOT/c.whl\"",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Remote is up to date"));

    mirror.assert_remote_not_exists("a.whl");
    mirror.assert_remote_exists("b.whl");
    assert_eq!(mirror.read_remote("c.whl"), "c\n");
}

#[cfg(unix)]
#[test]
fn test_run_passes_child_exit_code_through() {
    let mirror = TestMirror::new();

    mirror_cmd_for(&mirror)
        .args(["run", "--", "sh", "-c", "echo out > \"$PKG_MIRROR_LOCAL_ROOT/x.whl\"; exit 3"])
        .assert()
        .code(3);

    // The after phase still ran
    mirror.assert_remote_exists("x.whl");
}

#[cfg(unix)]
#[test]
fn test_run_skips_child_when_pull_fails() {
    let mirror = TestMirror::new();
    let marker = mirror.root().join("ran");

    mirror_cmd()
        .arg("--local-root")
        .arg(mirror.local_root())
        .arg("--remote-root")
        .arg(mirror.root().join("missing"))
        .args(["run", "--", "touch"])
        .arg(&marker)
        .assert()
        .failure();

    assert!(!marker.exists());
}

#[test]
fn test_run_unknown_program_fails() {
    let mirror = TestMirror::new();

    mirror_cmd_for(&mirror)
        .args(["run", "--", "pkg-mirror-no-such-program"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to run"));
}
