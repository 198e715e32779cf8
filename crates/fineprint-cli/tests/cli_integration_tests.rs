//! CLI integration tests
//!
//! Only the offline commands and argument validation are exercised;
//! `snapshots` and `check` otherwise need the live archive.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

// ---- Helpers ----

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fineprint"))
}

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.display().to_string()
}

// ---- diff ----

#[test]
fn test_diff_prints_unified_hunk() {
    let dir = TempDir::new().unwrap();
    let before = write(&dir, "before.txt", "keep\nSection 1: 30 days.\nkeep\n");
    let after = write(&dir, "after.txt", "keep\nSection 1: 7 days.\nkeep\n");

    let output = bin()
        .args(["diff", &before, &after, "--context", "0"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout,
        format!(
            "--- {before}\n+++ {after}\n@@ -2,1 +2,1 @@\n-Section 1: 30 days.\n+Section 1: 7 days.\n"
        )
    );
}

#[test]
fn test_diff_of_identical_files_is_empty() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.txt", "same\n");
    let b = write(&dir, "b.txt", "same\n");

    let output = bin().args(["diff", &a, &b]).output().unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_diff_missing_file_fails() {
    let output = bin()
        .args(["diff", "/nonexistent/a.txt", "/nonexistent/b.txt"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

// ---- strip ----

#[test]
fn test_strip_file_with_default_markers() {
    let dir = TempDir::new().unwrap();
    let page = write(
        &dir,
        "page.html",
        "<p>a</p><!-- BEGIN WAYBACK TOOLBAR INSERT -->junk<!-- END WAYBACK TOOLBAR INSERT --><p>b</p>",
    );

    let output = bin().args(["strip", &page]).output().unwrap();

    assert!(output.status.success());
    assert_eq!(output.stdout, b"<p>a</p><p>b</p>");
}

#[test]
fn test_strip_stdin_with_custom_markers() {
    let mut child = bin()
        .args(["strip", "--begin", "[[", "--end", "]]"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"X[[hidden]]Z")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, b"XZ");
}

#[test]
fn test_strip_rejects_empty_marker() {
    let output = bin()
        .args(["strip", "--begin", "", "/dev/null"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ---- snapshots ----

#[test]
fn test_snapshots_rejects_out_of_range_grace_days() {
    for grace in ["36501", "100000000", "9223372036854775807"] {
        let output = bin()
            .args(["snapshots", "https://acme.test/privacy", "--grace-days", grace])
            .env_remove("FINEPRINT_CONFIG")
            .output()
            .unwrap();

        assert!(!output.status.success(), "grace {grace}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("--grace-days must be between 0 and 36500"), "{stderr}");
    }
}
