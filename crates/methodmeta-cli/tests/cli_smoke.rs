use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "methodmeta-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_methodmeta<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_methodmeta");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("methodmeta command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

/// Keep only the fields an `expect.json` pins down; fingerprints and detail
/// text are free to change.
fn project_method(row: &Value) -> Value {
    let mut projected = serde_json::Map::new();
    projected.insert("method".into(), row["method"].clone());
    projected.insert("published".into(), row["published"].clone());
    if let Some(constrained) = row.get("constrained") {
        projected.insert("constrained".into(), constrained.clone());
    }
    if let Some(error) = row.get("error") {
        projected.insert("errorKind".into(), error["kind"].clone());
        if let Some(parameter) = error.get("parameter") {
            projected.insert("parameter".into(), parameter.clone());
        }
        if let Some(constraint) = error.get("constraint") {
            projected.insert("constraint".into(), constraint.clone());
        }
    }
    Value::Object(projected)
}

fn run_fixture_output(dir: &Path) -> Output {
    let mut args = vec![
        "aggregate".to_string(),
        dir.join("hierarchy.json").display().to_string(),
        "--json".to_string(),
    ];
    let config = dir.join("config.toml");
    if config.exists() {
        args.push("--config".to_string());
        args.push(config.display().to_string());
    }
    run_methodmeta(&args)
}

fn run_fixture(dir: &Path) -> (Output, Value) {
    let output = run_fixture_output(dir);
    let payload = parse_json_stdout(&output);
    (output, payload)
}

#[test]
fn fixtures_match_expectations() {
    let mut entries: Vec<PathBuf> = fs::read_dir(fixtures_dir())
        .expect("fixtures dir should exist")
        .map(|entry| entry.expect("fixture entry").path())
        .filter(|path| path.join("expect.json").exists())
        .collect();
    entries.sort();
    assert!(!entries.is_empty(), "no fixtures found");

    for dir in entries {
        let expect = read_json(&dir.join("expect.json"));
        let output = run_fixture_output(&dir);

        let name = dir.file_name().and_then(OsStr::to_str).unwrap_or("?");
        assert_eq!(
            output.status.code().map(i64::from),
            expect["exitCode"].as_i64(),
            "fixture {name}: exit code\nstderr:\n{}",
            stderr_text(&output)
        );

        if let Some(needle) = expect["stderrContains"].as_str() {
            assert!(
                stderr_text(&output).contains(needle),
                "fixture {name}: stderr should mention {needle:?}\nstderr:\n{}",
                stderr_text(&output)
            );
        }
        if expect.get("methods").is_none() {
            assert!(output.stdout.is_empty(), "fixture {name}: rejected input printed a report");
            continue;
        }

        let payload = parse_json_stdout(&output);
        let projected: Vec<Value> = payload["report"]["methods"]
            .as_array()
            .expect("report.methods should be an array")
            .iter()
            .map(project_method)
            .collect();
        assert_eq!(
            Value::Array(projected),
            expect["methods"],
            "fixture {name}: projected methods"
        );
    }
}

#[test]
fn published_methods_carry_fingerprints() {
    let (output, payload) = run_fixture(&fixtures_dir().join("interface_precondition"));
    assert_success(&output);
    assert_eq!(payload["clean"], true);
    assert_eq!(payload["strictness"], "standard");
    for row in payload["report"]["methods"].as_array().unwrap() {
        let fingerprint = row["fingerprint"].as_str().expect("fingerprint should be set");
        assert_eq!(fingerprint.len(), 64);
    }
}

#[test]
fn failed_methods_list_every_violation() {
    let (output, payload) = run_fixture(&fixtures_dir().join("strengthened_override"));
    assert_failure(&output);
    let violations = payload["violations"]["f(java.lang.Object)"]
        .as_array()
        .expect("violations should be keyed by method");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0]["sites"], serde_json::json!(["C", "I"]));
    assert_eq!(
        payload["failuresByKind"]["parameter constraint strengthened"],
        1
    );
}

#[test]
fn strictness_flag_overrides_settings_file() {
    let dir = fixtures_dir().join("strict_cascade");
    let output = run_methodmeta([
        OsStr::new("aggregate"),
        dir.join("hierarchy.json").as_os_str(),
        OsStr::new("--config"),
        dir.join("config.toml").as_os_str(),
        OsStr::new("--strictness"),
        OsStr::new("standard"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["strictness"], "standard");
    assert_eq!(payload["report"]["publishedCount"], 1);
}

#[test]
fn human_output_summarizes_failures() {
    let dir = fixtures_dir().join("diamond_ambiguous");
    let output = run_methodmeta([
        OsStr::new("aggregate"),
        dir.join("hierarchy.json").as_os_str(),
        OsStr::new("--jobs"),
        OsStr::new("1"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout_text(&output);
    assert!(text.contains("  Methods: 1"));
    assert!(text.contains("  Failed: 1"));
    assert!(text.contains("  Clean: no"));
    assert!(text.contains("ambiguous parameter constraints in f(java.lang.String)"));
}

#[test]
fn unreadable_input_exits_with_usage_error() {
    let tmp = TempDirGuard::new("missing");
    let missing = tmp.path().join("absent.json");
    let output = run_methodmeta([OsStr::new("aggregate"), missing.as_os_str()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_text(&output).starts_with("error: failed to read"));
}

#[test]
fn malformed_document_exits_with_usage_error() {
    let tmp = TempDirGuard::new("invalid");
    let path = tmp.path().join("hierarchy.json");
    fs::write(
        &path,
        r#"{"methods":[{"name":"f","parameterTypes":["A"],"sites":[
            {"declaringType":"C","parameters":[{},{}]}
        ]}]}"#,
    )
    .expect("document should be written");

    let output = run_methodmeta([OsStr::new("aggregate"), path.as_os_str()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_text(&output).contains("invalid hierarchy document"));

    fs::write(&path, "{ not json").expect("document should be written");
    let output = run_methodmeta([OsStr::new("aggregate"), path.as_os_str()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_text(&output).contains("failed to parse"));
}

#[test]
fn unknown_strictness_is_rejected() {
    let dir = fixtures_dir().join("interface_precondition");
    let output = run_methodmeta([
        OsStr::new("aggregate"),
        dir.join("hierarchy.json").as_os_str(),
        OsStr::new("--strictness"),
        OsStr::new("lenient"),
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_text(&output).contains("unknown strictness level: lenient"));
}

#[test]
fn verbose_logs_to_stderr_only() {
    let (quiet, _) = run_fixture(&fixtures_dir().join("interface_precondition"));
    let dir = fixtures_dir().join("interface_precondition");
    let loud = run_methodmeta([
        OsStr::new("--verbose"),
        OsStr::new("aggregate"),
        dir.join("hierarchy.json").as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&loud);
    assert!(stderr_text(&loud).contains("published method metadata"));
    assert!(stderr_text(&loud).contains("folding declaration site"));
    assert_eq!(parse_json_stdout(&loud), parse_json_stdout(&quiet));
}

#[test]
fn error_kinds_json_lists_registry() {
    let output = run_methodmeta(["error-kinds", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["schema"], 1);
    let kinds = payload["kinds"].as_array().expect("kinds should be an array");
    assert_eq!(kinds.len(), 5);
    assert_eq!(kinds[0]["label"], "incompatible signature");
}

#[test]
fn error_kinds_text_output() {
    let output = run_methodmeta(["error-kinds"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.starts_with("methodmeta error-kinds\n"));
    assert!(text.contains("  Kinds: 5"));
    assert!(text.contains("    - malformed hierarchy:"));
}
