//! Common test utilities for monitask integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory so nothing touches the real ~/.monitask
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".monitask");

        Ok(Self { temp_dir, data_dir })
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// A command with HOME pointed at the test environment and no API key
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_monitask"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("MONITASK_API_KEY");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, json: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.data_file("config.json"), json)?;
        Ok(())
    }

    /// Write a saved session snapshot under the default sessions dir
    pub fn write_session(&self, file: &str, json: &str) -> anyhow::Result<()> {
        let dir = self.data_dir.join("sessions");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(file), json)?;
        Ok(())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
