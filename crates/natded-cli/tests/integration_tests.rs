//! Integration tests for natded-cli
//!
//! These tests verify end-to-end functionality of the CLI tool using assert_cmd.

#![allow(deprecated)]

use assert_cmd::prelude::*;
use natded_core::{parse_expr, RuleCatalog, Substitution, Workspace};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Get the CLI binary command, isolated from any user configuration
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("natded").expect("Failed to find natded binary");
    cmd.arg("--no-config").arg("--no-color");
    cmd
}

/// Write a session with one proof of `P => P`, optionally left unfinished
fn session_file(dir: &TempDir, name: &str, finished: bool) -> PathBuf {
    let mut ws = Workspace::new(RuleCatalog::default());
    let t = ws.add_goal(parse_expr("P => P").unwrap());
    let goal = ws.tree(t).unwrap().root_id();
    ws.apply_rule("implI", t, goal, &Substitution::empty())
        .unwrap()
        .unwrap();
    if finished {
        let tree = ws.tree(t).unwrap();
        let owner = tree.root_id();
        let premise = tree.root().hypotheses()[0].id();
        ws.merge_assumption(t, owner, premise).unwrap().unwrap();
    }
    let path = dir.path().join(name);
    fs::write(&path, ws.to_document_json().unwrap()).expect("Failed to write session file");
    path
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("natural deduction"))
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_command() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("natded"));
}

#[test]
fn test_parse_prints_canonical_form() {
    cli()
        .args(["parse", "a & b => c"])
        .assert()
        .success()
        .stdout("a ⋀ b ⇒ c\n");
}

#[test]
fn test_parse_ascii_notation() {
    cli()
        .args(["--ascii", "parse", "a ∧ (b ∨ ¬c)"])
        .assert()
        .success()
        .stdout("a & (b | ~c)\n");
}

#[test]
fn test_parse_french_keywords() {
    cli()
        .args(["--locale", "fr", "parse", "non P et Q"])
        .assert()
        .success()
        .stdout("¬P ⋀ Q\n");
}

#[test]
fn test_parse_json() {
    cli()
        .args(["parse", "--json", "P => q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Implies\""))
        .stdout(predicate::str::contains("\"Variable\": \"P\""))
        .stdout(predicate::str::contains("\"MetaVariable\": \"q\""));
}

#[test]
fn test_parse_error_exits_with_failure() {
    cli()
        .args(["parse", "P & (Q"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse formula"))
        .stderr(predicate::str::contains("^"));
}

#[test]
fn test_rules_listing() {
    cli()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("andI"))
        .stdout(predicate::str::contains("raa"));
}

#[test]
fn test_rules_filtering() {
    cli()
        .args(["rules", "--exclude-rule", "raa", "--exclude-rule", "tnd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("andI"))
        .stdout(predicate::str::contains("raa").not())
        .stdout(predicate::str::contains("tnd").not());

    cli()
        .args(["rules", "--include-rule", "andI"])
        .assert()
        .success()
        .stdout(predicate::str::contains("andI"))
        .stdout(predicate::str::contains("orE").not());
}

#[test]
fn test_check_complete_session() {
    let dir = TempDir::new().unwrap();
    let path = session_file(&dir, "done.ndp", true);
    cli()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 proofs complete"))
        .stdout(predicate::str::contains("(⇒I) [P]"));
}

#[test]
fn test_check_incomplete_session() {
    let dir = TempDir::new().unwrap();
    let path = session_file(&dir, "open.ndp", false);
    cli()
        .arg("check")
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("0 of 1 proofs complete"))
        .stdout(predicate::str::contains("1 open goal"));
}

#[test]
fn test_check_missing_file() {
    cli()
        .args(["check", "/nonexistent/session.ndp"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read session file"));
}

#[test]
fn test_check_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.ndp");
    fs::write(&path, "{\"version\": \"1.0.0\"").unwrap();
    cli()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid session file"));
}

#[test]
fn test_config_show() {
    cli()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("locale = \"en\""))
        .stdout(predicate::str::contains("[repl]"));
}

#[test]
fn test_config_path_honors_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    cli()
        .env("NATDED_CONFIG", &path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("natdedrc.toml");
    fs::write(&path, "notation = \"ascii\"\nlocale = \"de\"\n").unwrap();
    Command::cargo_bin("natded")
        .unwrap()
        .env("NATDED_CONFIG", &path)
        .args(["--no-color", "parse", "nicht P oder Q"])
        .assert()
        .success()
        .stdout("~P | Q\n");
}

#[test]
fn test_completion_generation() {
    cli()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("natded"));
}

#[test]
fn test_repl_session_from_stdin() {
    let home = TempDir::new().unwrap();
    let mut cmd = cli();
    cmd.env("HOME", home.path()).arg("repl");
    assert_cmd::Command::from(cmd)
        .write_stdin("goal P => P\napply implI 0 1\nassume 0 1 2\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Proof complete"));
}

#[test]
fn test_repl_reports_errors_and_continues() {
    let home = TempDir::new().unwrap();
    let mut cmd = cli();
    cmd.env("HOME", home.path()).arg("repl");
    assert_cmd::Command::from(cmd)
        .write_stdin("bogus\ngoal Q\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown command 'bogus'"))
        .stdout(predicate::str::contains("? Q"));
}
