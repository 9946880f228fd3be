//! Integration tests for the stackvm CLI.
//!
//! These tests invoke the `stackvm` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn stackvm() -> Command {
    Command::cargo_bin("stackvm").unwrap()
}

/// Return the absolute path to a test program file.
fn test_program(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/programs")
        .join(name)
}

fn program_arg(name: &str) -> String {
    test_program(name).to_str().unwrap().to_string()
}

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    stackvm()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: stackvm"));
}

#[test]
fn help_flag_exits_0() {
    stackvm()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("compile <prog.json>"));
}

#[test]
fn unknown_command_exits_1() {
    stackvm()
        .arg("frobnicate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown command 'frobnicate'"));
}

// ---- run ----

#[test]
fn run_countdown_prints_each_value() {
    stackvm()
        .args(["run", &program_arg("countdown.json")])
        .assert()
        .success()
        .stdout("3\n2\n1\n");
}

#[test]
fn run_call_prints_sum() {
    stackvm()
        .args(["run", &program_arg("add.json")])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn run_small_budget_exits_4() {
    stackvm()
        .args(["run", &program_arg("countdown.json"), "--budget", "20"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("budget of 20 exhausted"));
}

#[test]
fn run_infinite_loop_exits_4() {
    stackvm()
        .args(["run", &program_arg("spin.json")])
        .assert()
        .code(4);
}

#[test]
fn run_division_by_zero_exits_3() {
    stackvm()
        .args(["run", &program_arg("divide_by_zero.json")])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("runtime error: division by zero"));
}

#[test]
fn run_trace_goes_to_stderr() {
    stackvm()
        .args(["run", &program_arg("add.json"), "--trace"])
        .assert()
        .success()
        .stdout("5\n")
        .stderr(predicate::str::contains("INS: 0000 PUSH_FRAME"))
        .stderr(predicate::str::contains("STB: SP(0)"));
}

#[test]
fn run_invalid_budget_exits_1() {
    stackvm()
        .args(["run", &program_arg("add.json"), "--budget", "lots"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid budget 'lots'"));
}

#[test]
fn run_budget_missing_value_exits_1() {
    stackvm()
        .args(["run", &program_arg("add.json"), "--budget"])
        .assert()
        .code(1);
}

#[test]
fn run_unknown_flag_exits_1() {
    stackvm()
        .args(["run", &program_arg("add.json"), "--fast"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown argument '--fast'"));
}

#[test]
fn run_missing_file_exits_1() {
    stackvm()
        .args(["run", "/nonexistent/prog.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn run_requires_input() {
    stackvm()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("run requires an input file"));
}

#[test]
fn run_malformed_json_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{ \"body\": [ { \"kind\": \"Lambda\" } ] }").unwrap();
    stackvm()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("malformed program"));
}

#[test]
fn run_undefined_name_exits_2() {
    stackvm()
        .args(["run", &program_arg("undefined_name.json")])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("undefined symbol 'y' in main"));
}

#[test]
fn run_without_entrypoint_exits_2() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noentry.json");
    fs::write(
        &path,
        r#"{ "body": [ { "kind": "FunctionDef", "name": "main", "body": [] } ] }"#,
    )
    .unwrap();
    stackvm()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("@entrypoint"));
}

// ---- compile ----

#[test]
fn compile_prints_listing_starting_with_start_routine() {
    stackvm()
        .args(["compile", &program_arg("add.json")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "0000 PUSH_FRAME\n0001 STAGE_FRAME\n0002 COMMIT_FRAME\n0003 PUSH IP(5)\n",
        ))
        .stdout(predicate::str::contains("HALT"));
}

#[test]
fn compile_symbolic_keeps_labels() {
    stackvm()
        .args(["compile", &program_arg("countdown.json"), "--symbolic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<start>:"))
        .stdout(predicate::str::contains("main:"))
        .stdout(predicate::str::contains("JUMP_COND @main."));
}

#[test]
fn compile_error_exits_2() {
    stackvm()
        .args(["compile", &program_arg("undefined_name.json")])
        .assert()
        .code(2);
}
