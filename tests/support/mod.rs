#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway directory holding a task file and optional config.
pub struct TestStore {
    dir: TempDir,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("tasks.json")
    }

    pub fn write_raw(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.store_path();
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_tasks(&self, tasks: &Value) -> std::io::Result<PathBuf> {
        self.write_raw(&serde_json::to_string_pretty(tasks).expect("serialize tasks"))
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(".tickler.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_tasks(&self) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.store_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn read_task(&self, id: &str) -> Result<Value, Box<dyn std::error::Error>> {
        self.read_tasks()?
            .into_iter()
            .find(|task| task["id"] == id)
            .ok_or_else(|| format!("task {id} not in store").into())
    }

    /// `tickler` running inside the store directory with a fixed today.
    pub fn cmd(&self, today: &str) -> Command {
        let mut cmd = tickler_cmd();
        cmd.current_dir(self.path())
            .env("TICKLER_STORE", self.store_path())
            .env("TICKLER_TODAY", today);
        cmd
    }
}

pub fn tickler_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tickler").expect("binary");
    cmd.env_remove("TICKLER_CONFIG")
        .env_remove("TICKLER_STORE")
        .env_remove("TICKLER_TODAY")
        .env_remove("RUST_LOG");
    cmd
}

/// Parse the JSON envelope printed by a `--json` command.
pub fn json_output(output: &[u8]) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_slice(output)?)
}
