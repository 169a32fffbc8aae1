//! Common test utilities for prefs integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never touch the
//! user's real data directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// Schema written into every `TestEnv`.
pub const BUSINESS_SCHEMA: &str = r#"
schema "BusinessPreferences"

group "General" label="General Settings" {
    pref "store_name_on_receipt" type="boolean" default=#true label="Show store name on receipt"
    pref "receipt_footer" type="string" default="Thank you!" label="Receipt footer" max-length=200
}

group "Fuel" label="Fuel Settings" {
    pref "prepay_enabled" type="boolean" default=#true label="Enable fuel prepay"
    pref "max_prepay_amount" type="integer" default=15000 label="Max prepay (cents)" ge=0
    pref "default_grade" type="string" default="regular" label="Default fuel grade" {
        choice "regular" "Regular"
        choice "mid" "Mid-Grade"
        choice "premium" "Premium"
    }
}
"#;

/// A test environment with an isolated working and data directory.
///
/// - `work_dir`: current directory for the binary; holds `schema.kdl`
/// - `data_dir`: holds `records.json` (via `PREFS_DATA_DIR`)
pub struct TestEnv {
    pub work_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new environment with the business schema in place.
    pub fn new() -> Self {
        let env = Self {
            work_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        };
        env.write_schema(BUSINESS_SCHEMA);
        env
    }

    /// Create an environment with `megacorp <- acme <- store-1` already set up.
    pub fn with_chain() -> Self {
        let env = Self::new();
        env.prefs().args(["record", "create", "megacorp"]).assert().success();
        env.prefs()
            .args([
                "record",
                "create",
                "acme",
                "--inherits-from",
                "chain",
                "--relation",
                "chain=megacorp",
            ])
            .assert()
            .success();
        env.prefs()
            .args([
                "record",
                "create",
                "store-1",
                "--inherits-from",
                "business",
                "--relation",
                "business=acme",
            ])
            .assert()
            .success();
        env
    }

    /// Replace `schema.kdl` in the working directory.
    pub fn write_schema(&self, content: &str) {
        std::fs::write(self.work_dir.path().join("schema.kdl"), content).unwrap();
    }

    /// Get a Command for the prefs binary with isolated directories.
    ///
    /// Sets `PREFS_DATA_DIR` per-command for parallel safety and clears
    /// `PREFS_SCHEMA` so the working directory's `schema.kdl` is used.
    pub fn prefs(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_prefs"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("PREFS_DATA_DIR", self.data_dir.path());
        cmd.env_remove("PREFS_SCHEMA");
        cmd.env_remove("PREFS_LOG");
        cmd
    }

    /// Run a command expected to succeed and parse its JSON stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.prefs().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "prefs {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    pub fn records_path(&self) -> std::path::PathBuf {
        self.data_dir.path().join("records.json")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
