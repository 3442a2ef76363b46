//! Command-line behaviour of the `idshift` binary

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use tempfile::TempDir;

fn idshift() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("idshift");
    cmd.env_remove("DEBUG");
    cmd
}

#[test]
fn test_no_arguments_prints_usage() {
    idshift()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_carries_example() {
    idshift()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "idshift /var/lib/lxd/containers/c1/rootfs -1000000",
        ));
}

#[test]
fn test_zero_offset_rejected() {
    let temp_dir = TempDir::new().unwrap();
    idshift()
        .arg(temp_dir.path())
        .arg("0")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("offset cannot be zero"))
        .stdout(predicate::str::contains("Starting").not());
}

#[test]
fn test_non_integer_offset_rejected() {
    let temp_dir = TempDir::new().unwrap();
    idshift()
        .arg(temp_dir.path())
        .arg("12abc")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_directory_rejected() {
    let temp_dir = TempDir::new().unwrap();
    idshift()
        .arg(temp_dir.path().join("absent"))
        .arg("1000")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn test_file_target_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("plain");
    std::fs::write(&file, b"x").unwrap();
    idshift()
        .arg(&file)
        .arg("1000")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not a directory"));
}

#[test]
fn test_run_prints_banner_and_summary() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("a"), b"a").unwrap();
    std::fs::create_dir(temp_dir.path().join("d")).unwrap();

    // No ordinary id is at or above 4e9, so nothing is touched
    idshift()
        .arg(temp_dir.path())
        .arg("-4000000000")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Starting UID/GID shift in {}",
            temp_dir.path().display()
        )))
        .stdout(predicate::str::contains("Offset: -4000000000"))
        .stdout(predicate::str::contains("0 shifted, 3 unchanged, 0 warnings, 0 failed"))
        .stdout(predicate::str::ends_with("Shift complete.\n"));
}

#[test]
fn test_quiet_and_verbose_conflict() {
    let temp_dir = TempDir::new().unwrap();
    idshift()
        .arg("-q")
        .arg("-v")
        .arg(temp_dir.path())
        .arg("1000")
        .assert()
        .failure()
        .code(1);
}

fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

/// `dir` (0750) holding one file `a` (0644); returns the expected trace lines
/// for a shift by +100000
fn traced_tree(dir: &Path) -> Vec<String> {
    let file = dir.join("a");
    std::fs::write(&file, b"a").unwrap();
    std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o750)).unwrap();

    [(file.as_path(), "-rw-r--r--"), (dir, "drwxr-x---")]
        .into_iter()
        .map(|(path, mode)| {
            let meta = path.symlink_metadata().unwrap();
            format!(
                "Shifted: {} ({}:{} -> {}:{}) {mode}",
                path.display(),
                meta.uid(),
                meta.gid(),
                meta.uid() + 100_000,
                meta.gid() + 100_000
            )
        })
        .collect()
}

#[test]
fn test_opening_separator_follows_banner() {
    let temp_dir = TempDir::new().unwrap();
    idshift()
        .arg(temp_dir.path())
        .arg("-4000000000")
        .assert()
        .success()
        .stdout(predicate::str::contains("Offset: -4000000000\n---\n"));
}

#[test]
fn test_debug_env_prints_trace_lines() {
    if !is_root() {
        eprintln!("SKIPPED: shifting ownership requires root");
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    let expected = traced_tree(temp_dir.path());

    let stderr = idshift()
        .env("DEBUG", "yes")
        .arg(temp_dir.path())
        .arg("100000")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 shifted, 0 unchanged"))
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&stderr);
    for line in &expected {
        assert!(stderr.contains(line.as_str()), "missing {line:?} in:\n{stderr}");
    }
}

#[test]
fn test_trace_lines_absent_by_default() {
    if !is_root() {
        eprintln!("SKIPPED: shifting ownership requires root");
        return;
    }

    let temp_dir = TempDir::new().unwrap();
    traced_tree(temp_dir.path());

    idshift()
        .arg(temp_dir.path())
        .arg("100000")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 shifted, 0 unchanged"))
        .stderr(predicate::str::contains("Shifted:").not());
}
