//! Common test utilities for running the `nuwa` binary.

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

/// Variables that would leak the developer's setup into a test run
const ISOLATED_VARS: &[&str] = &[
    "NUWA_ENV",
    "NUWA_API_BASE_URL",
    "NUWA_API_TIMEOUT_MS",
    "NUWA_ENABLE_MOCK",
    "NUWA_LANG",
    "NUWA_LOG_LEVEL",
    "NUWA_USER_ID",
    "RUST_LOG",
];

/// Test context with a temporary project directory
pub struct TestContext {
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Write `.nuwa/config.yaml`
    pub fn with_config(self, yaml: &str) -> Self {
        let dir = self.path().join(".nuwa");
        std::fs::create_dir_all(&dir).expect("Failed to create config dir");
        std::fs::write(dir.join("config.yaml"), yaml).expect("Failed to write config");
        self
    }

    /// Config pointing at a backend nobody listens on, with no fallback
    pub fn with_offline_backend(self) -> Self {
        self.with_config(
            r#"
api:
  base_url: http://127.0.0.1:9
  timeout_ms: 500
  health_timeout_ms: 500
  retry_count: 1
  enable_mock: false
"#,
        )
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A `nuwa` command running inside this project
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("nuwa").expect("Binary not found");
        cmd.current_dir(self.path()).env("NUWA_CONFIG_DIR", self.path());
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }
}

/// Assert helpers for CLI output
pub trait OutputAssertions {
    fn assert_success(&self);
    fn assert_stdout_contains(&self, text: &str);
    fn assert_stderr_contains(&self, text: &str);
    fn assert_exit_code(&self, code: i32);
}

impl OutputAssertions for Output {
    fn assert_success(&self) {
        assert!(
            self.status.success(),
            "Command failed with status: {}\nstderr: {}",
            self.status,
            String::from_utf8_lossy(&self.stderr)
        );
    }

    fn assert_stdout_contains(&self, text: &str) {
        let stdout = String::from_utf8_lossy(&self.stdout);
        assert!(stdout.contains(text), "stdout did not contain '{text}'\nstdout: {stdout}");
    }

    fn assert_stderr_contains(&self, text: &str) {
        let stderr = String::from_utf8_lossy(&self.stderr);
        assert!(stderr.contains(text), "stderr did not contain '{text}'\nstderr: {stderr}");
    }

    fn assert_exit_code(&self, code: i32) {
        assert_eq!(
            self.status.code(),
            Some(code),
            "Expected exit code {code}, got {:?}\nstderr: {}",
            self.status.code(),
            String::from_utf8_lossy(&self.stderr)
        );
    }
}
