use assert_cmd::Command;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct TixRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl TixRun {
    pub fn json(&self) -> Value {
        serde_json::from_str(&extract_json_payload(&self.stdout))
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", self.stdout))
    }

    /// Structured error printed on stderr.
    pub fn error_code(&self) -> Option<String> {
        let payload = extract_json_payload(&self.stderr);
        let value: Value = serde_json::from_str(&payload).ok()?;
        value["error"]["code"].as_str().map(str::to_string)
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }
}

pub struct TixWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl TixWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    /// A workspace with `tix init` already run.
    pub fn initialized() -> Self {
        let workspace = Self::new();
        let run = run_tix(&workspace, ["init"], "init");
        assert!(run.status.success(), "init failed: {}", run.stderr);
        workspace
    }

    /// Create a ticket and return its id.
    pub fn create(&self, title: &str, extra: &[&str]) -> i64 {
        let mut args = vec!["create", title, "--json"];
        args.extend_from_slice(extra);
        let run = run_tix(self, args, "create");
        assert!(run.status.success(), "create failed: {}", run.stderr);
        run.json()["id"].as_i64().expect("created id")
    }
}

pub fn run_tix<I, S>(workspace: &TixWorkspace, args: I, label: &str) -> TixRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tix_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_tix_with_env<I, S, E, K, V>(
    workspace: &TixWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> TixRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tix"));
    cmd.current_dir(&workspace.root);
    for key in ["TIX_DIR", "TIX_DB", "TIX_LOG_FORMAT", "TIX_PAGE_SIZE", "TIX_DEFAULT_PRIORITY"] {
        cmd.env_remove(key);
    }
    cmd.args(args);
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "tix=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);

    let start = Instant::now();
    let output = cmd.output().expect("run tix");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    TixRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Strip anything before the first JSON line (log output on stderr).
pub fn extract_json_payload(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    output.trim().to_string()
}
