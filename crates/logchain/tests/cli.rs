//! `logscan` against log files on disk.

mod common;

use clap::Parser;
use std::fs;

use common::{config, logger};
use logchain::cli::{run, Cli};
use logchain_testkit::fixtures::tamper;

fn write_log(full: bool) -> (tempfile::TempDir, String, Vec<String>) {
    let (log, buf) = logger(&config(full, true, false));
    for i in 0..5 {
        log.info("step", vec![logchain::Attr::new("n", i)]).unwrap();
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(&path, buf.text()).unwrap();
    (dir, path.display().to_string(), buf.lines())
}

fn scan(args: &[&str]) -> anyhow::Result<bool> {
    let cli = Cli::try_parse_from(std::iter::once("logscan").chain(args.iter().copied()))?;
    run(cli)
}

#[test]
fn test_clean_file() {
    let (_dir, path, _) = write_log(false);
    assert!(scan(&["--file", &path, "--chain"]).unwrap());
}

#[test]
fn test_full_mode_needs_full_flag() {
    let (_dir, path, _) = write_log(true);
    assert!(scan(&["--file", &path, "--chain", "--full"]).unwrap());
    assert!(!scan(&["--file", &path, "--chain"]).unwrap());
}

#[test]
fn test_tampered_file() {
    let (dir, _, mut lines) = write_log(true);
    lines[2] = tamper(&lines[2], "n", serde_json::json!(7));
    let path = dir.path().join("tampered.log");
    fs::write(&path, lines.join("\n")).unwrap();
    let path = path.display().to_string();
    assert!(!scan(&["--file", &path, "--chain", "--full", "scan"]).unwrap());
}

#[test]
fn test_missing_file() {
    let err = scan(&["--file", "/nonexistent/logchain/app.log"]).unwrap_err();
    assert!(err.to_string().contains("can't open log file"));
}

#[test]
fn test_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.log");
    fs::write(&path, "{\"msg\": \"a\"\n").unwrap();
    let path = path.display().to_string();
    assert!(scan(&["--file", &path]).is_err());
}
