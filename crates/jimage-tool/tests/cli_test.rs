//! Integration tests for the jimage-tool CLI

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

fn jimage() -> Command {
    let mut cmd = Command::cargo_bin("jimage-tool").unwrap();
    for var in [
        "JIMAGE_OUTPUT",
        "JIMAGE_COMPRESS",
        "JIMAGE_COMPRESSION_LEVEL",
        "JIMAGE_BYTE_ORDER",
        "JIMAGE_EXTERNAL_DIR",
        "JIMAGE_RETRY_LIMIT",
        "JIMAGE_GROWTH_LIMIT",
        "JIMAGE_EXTRACT_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Plain `app` module plus a sectioned `java.base` module
fn modules() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();

    let app = dir.path().join("app");
    fs::create_dir_all(app.join("com/example/util")).unwrap();
    fs::create_dir_all(app.join("META-INF")).unwrap();
    fs::write(app.join("com/example/Main.class"), b"main class").unwrap();
    fs::write(app.join("com/example/util/Helper.class"), b"helper").unwrap();
    fs::write(app.join("META-INF/MANIFEST.MF"), b"Manifest-Version: 1.0\n").unwrap();

    let base = dir.path().join("base");
    fs::create_dir_all(base.join("classes/java/lang")).unwrap();
    fs::create_dir_all(base.join("lib")).unwrap();
    fs::write(base.join("classes/java/lang/Object.class"), b"object").unwrap();
    fs::write(base.join("classes/java/lang/String.class"), b"string").unwrap();
    fs::write(base.join("classes/module-info.class"), b"info").unwrap();
    fs::write(base.join("lib/libjava.so"), b"elf").unwrap();

    (dir, app, base)
}

fn build_image(dir: &Path, app: &Path, base: &Path, extra: &[&str]) -> PathBuf {
    let output = dir.join("modules");
    jimage()
        .args(["build", "--output"])
        .arg(&output)
        .args(extra)
        .arg(app)
        .arg(format!("java.base={}", base.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 6 resources"));
    output
}

#[test]
fn test_help_command() {
    jimage()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn test_version_command() {
    jimage()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jimage-tool"));
}

#[test]
fn test_invalid_command() {
    jimage()
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_build_and_list() {
    let (dir, app, base) = modules();
    let output = build_image(dir.path(), &app, &base, &[]);

    jimage()
        .args(["list", "--sorted"])
        .arg(&output)
        .assert()
        .success()
        .stdout(
            "/app/META-INF/MANIFEST.MF\n\
             /app/com/example/Main.class\n\
             /app/com/example/util/Helper.class\n\
             /java.base/java/lang/Object.class\n\
             /java.base/java/lang/String.class\n\
             /java.base/module-info.class\n",
        );
}

#[test]
fn test_info_json() {
    let (dir, app, base) = modules();
    let output = build_image(dir.path(), &app, &base, &["--compress", "--byte-order", "big"]);

    let assert = jimage().arg("info").arg(&output).arg("--json").assert().success();
    let json: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(json["byte_order"], "big");
    assert_eq!(json["header"]["location_count"], 6);
    assert_eq!(json["resources"], 6);
    assert_eq!(json["header"]["magic"], 0xCAFE_DADA_u32);
    assert_eq!(json["compressed_resources"], 6);
}

#[test]
fn test_info_text() {
    let (dir, app, base) = modules();
    let output = build_image(dir.path(), &app, &base, &["--byte-order", "little"]);

    jimage()
        .arg("info")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Magic:       0xCAFEDADA"))
        .stdout(predicate::str::contains("Byte order:  little"))
        .stdout(predicate::str::contains("Resources:   6"));
}

#[test]
fn test_verify() {
    let (dir, app, base) = modules();
    let output = build_image(dir.path(), &app, &base, &["--compress"]);

    jimage()
        .arg("verify")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Verified 6 resources (6 compressed"));
}

#[test]
fn test_extract_with_prefix() {
    let (dir, app, base) = modules();
    let output = build_image(dir.path(), &app, &base, &["--compress"]);
    let target = dir.path().join("extracted");

    jimage()
        .arg("extract")
        .arg(&output)
        .arg("--dir")
        .arg(&target)
        .args(["--include", "/java.base/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Extracted 3 resources"));

    assert_eq!(
        fs::read(target.join("java.base/java/lang/String.class")).unwrap(),
        b"string"
    );
    assert!(!target.join("app").exists());
}

#[test]
fn test_external_files_and_env_configuration() {
    let (dir, app, base) = modules();
    let output = dir.path().join("from-env");
    let runtime = dir.path().join("runtime");

    jimage()
        .env("JIMAGE_OUTPUT", &output)
        .env("JIMAGE_COMPRESS", "true")
        .env("JIMAGE_EXTERNAL_DIR", &runtime)
        .arg("build")
        .arg("--json")
        .arg(&app)
        .arg(format!("java.base={}", base.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"external_files\": 1"))
        .stdout(predicate::str::contains("\"compressed\": true"));

    assert!(output.is_file());
    assert_eq!(fs::read(runtime.join("lib/libjava.so")).unwrap(), b"elf");
}

#[test]
fn test_build_failure_leaves_no_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("modules");

    jimage()
        .args(["build", "--output"])
        .arg(&output)
        .arg(format!("ghost={}", dir.path().join("missing").display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to build image"));

    assert!(!output.exists());
}

#[test]
fn test_build_grows_table_for_inseparable_names() {
    let dir = tempdir().unwrap();
    for (module, files) in [("a", ["p/X.class", "p/Y.class"]), ("b", ["q/Z.txt", "q/W.txt"])] {
        for file in files {
            let path = dir.path().join(module).join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file).unwrap();
        }
    }
    let output = dir.path().join("modules");

    jimage()
        .args(["build", "--growth-limit", "0", "--output"])
        .arg(&output)
        .arg(dir.path().join("a"))
        .arg(dir.path().join("b"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("table of 4 slots"));
    assert!(!output.exists());

    jimage()
        .args(["build", "--output"])
        .arg(&output)
        .arg(dir.path().join("a"))
        .arg(dir.path().join("b"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 4 resources"));

    jimage()
        .arg("info")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Resources:   4"))
        .stdout(predicate::str::contains("Slots:       5"));
}

#[test]
fn test_open_rejects_non_image() {
    let dir = tempdir().unwrap();
    let bogus = dir.path().join("bogus");
    fs::write(&bogus, b"PK\x03\x04 this is a zip file, not an image").unwrap();

    jimage()
        .arg("info")
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid image magic"));
}
