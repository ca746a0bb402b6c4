//! Shared test infrastructure for integration tests.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch directory holding parameters and a tracker snapshot.
pub struct Scenario {
    pub dir: TempDir,
}

/// Parsed result of one `reqval validate` run.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub events: Vec<Value>,
    pub stderr: String,
}

impl RunResult {
    pub fn terminal(&self) -> &Value {
        self.events.last().expect("at least one event")
    }

    pub fn messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| event.get("message").and_then(Value::as_str))
            .collect()
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
    }
}

pub fn params(request_number: &str, options: &[(&str, bool)]) -> Value {
    let options: Vec<Value> = options
        .iter()
        .map(|(request_type, requires_approval)| {
            json!({"request_type": request_type, "requires_approval": requires_approval})
        })
        .collect();
    json!({
        "request_number": request_number,
        "package_adapter_instance": "42",
        "request_type_options": options,
    })
}

/// Request open across any plausible test clock.
pub fn open_request(request_number: &str, approved: bool, package_id: i64) -> Value {
    json!({
        "id": 100,
        "request_number": request_number,
        "application_name": "Payroll",
        "start_date_time": "2000-01-01T00:00:00Z",
        "end_date_time": "2999-12-31T23:59:59Z",
        "is_approved": approved,
        "is_complete": false,
        "packages": [{"package_id": package_id}],
    })
}

pub fn snapshot(requests: Vec<Value>) -> Value {
    json!({
        "instances": [{"id": "42", "package_key": "payroll"}],
        "packages": [{"id": 7, "name": "Payroll", "package_key": "payroll"}],
        "requests": requests,
    })
}

impl Scenario {
    pub fn new(params: &Value, snapshot: &Value) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_json(&dir.path().join("params.json"), params);
        write_json(&dir.path().join("snapshot.json"), snapshot);
        Self { dir }
    }

    pub fn params_path(&self) -> PathBuf {
        self.dir.path().join("params.json")
    }

    pub fn fixture_path(&self) -> PathBuf {
        self.dir.path().join("snapshot.json")
    }

    pub fn validate(&self, extra: &[&str]) -> RunResult {
        let output = reqval()
            .arg("validate")
            .arg("--params")
            .arg(self.params_path())
            .arg("--fixture")
            .arg(self.fixture_path())
            .arg("--format")
            .arg("json")
            .args(extra)
            .output()
            .expect("run reqval validate");
        parse_run(output)
    }
}

pub fn reqval() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_reqval"));
    command
        .env_remove("REQVAL_API_URL")
        .env_remove("REQVAL_LOG")
        .env_remove("RUST_LOG");
    command
}

fn parse_run(output: Output) -> RunResult {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let events = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("event JSON line"))
        .collect();
    RunResult {
        success: output.status.success(),
        events,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

fn write_json(path: &Path, value: &Value) {
    let text = serde_json::to_string_pretty(value).expect("serialize");
    std::fs::write(path, text).expect("write json");
}
