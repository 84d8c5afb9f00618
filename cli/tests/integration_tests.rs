use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path =
            std::env::temp_dir().join(format!("argspec_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const GREET_YAML: &str = r#"name: greet
options:
  - names: ["-h", "--help"]
    usage_help: true
  - names: ["-c", "--count"]
    arity: 1
    type: int
    required: true
positionals:
  - param_label: NAME
    arity: "0..*"
"#;

fn write_greet(dir: &TempDir) -> PathBuf {
    let path = dir.join("greet.yaml");
    fs::write(&path, GREET_YAML).expect("failed to write declaration");
    path
}

fn argspec(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_argspec"))
        .args(args)
        .output()
        .expect("failed to run argspec")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_prints_bound_values() {
    let dir = TempDir::new("parse_ok");
    let spec = write_greet(&dir);

    let out = argspec(&[
        "parse",
        "--spec",
        spec.to_str().unwrap(),
        "--",
        "-c",
        "3",
        "alice",
        "bob",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let json = stdout_json(&out);
    assert_eq!(json["command"], "greet");
    assert_eq!(json["bound_values"][0]["name"], "--count");
    assert_eq!(json["bound_values"][0]["value"], 3);
    assert_eq!(json["bound_values"][1]["value"], serde_json::json!(["alice", "bob"]));
    assert_eq!(json["unmatched_tokens"], serde_json::json!([]));
}

#[test]
fn parse_error_exits_with_two() {
    let dir = TempDir::new("parse_err");
    let spec = write_greet(&dir);

    let out = argspec(&["parse", "--spec", spec.to_str().unwrap(), "--", "-c", "x"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error: invalid value for --count"), "stderr: {stderr}");
}

#[test]
fn parse_unknown_option_strict_and_lenient() {
    let dir = TempDir::new("parse_unknown");
    let spec = write_greet(&dir);
    let spec = spec.to_str().unwrap();

    let strict = argspec(&["parse", "--spec", spec, "--", "-c", "1", "--loud"]);
    assert_eq!(strict.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("unknown option: '--loud'"));

    let lenient = argspec(&[
        "parse",
        "--spec",
        spec,
        "--allow-unmatched",
        "--",
        "-c",
        "1",
        "--loud",
    ]);
    assert!(lenient.status.success());
    assert_eq!(stdout_json(&lenient)["unmatched_tokens"], serde_json::json!(["--loud"]));
}

#[test]
fn parse_help_skips_required_check() {
    let dir = TempDir::new("parse_help");
    let spec = write_greet(&dir);

    let out = argspec(&["parse", "--spec", spec.to_str().unwrap(), "--", "--help"]);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out)["usage_help_requested"], true);
}

#[test]
fn parse_yaml_output() {
    let dir = TempDir::new("parse_yaml");
    let spec = write_greet(&dir);

    let out = argspec(&[
        "parse",
        "--spec",
        spec.to_str().unwrap(),
        "--format",
        "yaml",
        "--",
        "--count=7",
    ]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("command: greet"), "stdout: {stdout}");
    assert!(stdout.contains("value: 7"), "stdout: {stdout}");
}

#[test]
fn parse_trace_logs_decisions_to_stderr() {
    let dir = TempDir::new("parse_trace");
    let spec = write_greet(&dir);

    let out = argspec(&["parse", "--spec", spec.to_str().unwrap(), "--trace", "--", "-c", "1"]);
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Matched option"), "stderr: {stderr}");
}

#[test]
fn parse_missing_declaration_exits_with_one() {
    let out = argspec(&["parse", "--spec", "/nonexistent/argspec/greet.yaml"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to load"));
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_prints_inferred_defaults() {
    let dir = TempDir::new("resolve");
    let spec = write_greet(&dir);

    let out = argspec(&["resolve", "--spec", spec.to_str().unwrap()]);
    assert!(out.status.success());

    let json = stdout_json(&out);
    assert_eq!(json["name"], "greet");
    let args = json["args"].as_array().unwrap();
    assert_eq!(args.len(), 3);
    assert_eq!(args[0]["kind"], "option");
    assert_eq!(args[0]["type"], "boolean");
    assert_eq!(args[0]["arity"], "0");
    assert_eq!(args[1]["type"], "int");
    assert_eq!(args[2]["kind"], "positional");
    assert_eq!(args[2]["index"], "*");
    assert_eq!(args[2]["type"], "String[]");
    assert_eq!(args[2]["param_label"], "NAME");
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_counts_files_and_directories() {
    let dir = TempDir::new("check_ok");
    let greet = write_greet(&dir);
    let lib = TempDir::new("check_ok_lib");
    fs::write(lib.join("a.json"), r#"{"name": "a", "options": [{"names": ["-x"]}]}"#).unwrap();
    fs::write(lib.join("b.yml"), "name: b\npositionals: [{}]\n").unwrap();

    let out = argspec(&["check", greet.to_str().unwrap(), lib.path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("Checked 3 declaration(s): 3 option(s), 2 positional(s)."),
        "stdout: {stdout}"
    );
}

#[test]
fn check_reports_invalid_declaration() {
    let dir = TempDir::new("check_bad");
    let bad = dir.join("bad.json");
    fs::write(&bad, r#"{"name": "bad", "options": [{"names": ["-a"], "arity": "x"}]}"#).unwrap();

    let out = argspec(&["check", bad.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("invalid declaration for 'bad': invalid range syntax: 'x'"),
        "stderr: {stderr}"
    );
}
