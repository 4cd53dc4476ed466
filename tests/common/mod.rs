//! Common test utilities for integration tests

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch host: a temporary directory holding an os-release fixture and
/// the install/site directories a run would use
pub struct TestHost {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestHost {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write an os-release file for the given distribution
    pub fn write_os_release(&self, id: &str, version_id: &str) -> PathBuf {
        let mut content = format!("ID={id}\nNAME=\"{id}\"\n");
        if !version_id.is_empty() {
            content.push_str(&format!("VERSION_ID=\"{version_id}\"\n"));
        }
        let file = self.path.join("os-release");
        fs::write(&file, content).expect("Failed to write os-release");
        file
    }

    pub fn install_path(&self) -> PathBuf {
        self.path.join("env")
    }

    pub fn sitedir_path(&self) -> PathBuf {
        self.path.join("site")
    }

    /// `install` pinned to the fixture host, without package index lookups
    pub fn install(&self, id: &str, version_id: &str) -> Command {
        let mut cmd = self.command(id, version_id);
        cmd.arg("install").arg("--skip-version-check");
        cmd
    }

    /// An rbinstall command pinned to a Linux host described by the fixture
    pub fn command(&self, id: &str, version_id: &str) -> Command {
        let os_release = self.write_os_release(id, version_id);
        let mut cmd = rbinstall_cmd();
        cmd.arg("--no-color")
            .arg("--force-system")
            .arg("linux")
            .arg("--force-arch")
            .arg("x86_64")
            .arg("--os-release-file")
            .arg(os_release);
        cmd
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(deprecated)]
pub fn rbinstall_cmd() -> Command {
    Command::cargo_bin("rbinstall").unwrap()
}
