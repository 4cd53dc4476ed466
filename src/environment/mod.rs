//! Python runtime environment
//!
//! Creates the virtual environment the application runs from and installs
//! Python packages into it with pip. Index URLs are passed straight through
//! to pip; no caching or mirroring happens here.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, Result, exec, fs as fs_error};
use crate::process::{CommandOutput, CommandRunner, argv, join_cmdline};

/// pip configuration file inside the environment
pub const PIP_CONF: &str = "pip.conf";

/// First line of every pip.conf this tool writes
const MANAGED_MARKER: &str = "# Managed by rbinstall";

/// Output pip prints when it changed the environment
const PIP_INSTALLED: &str = "Successfully installed";

/// A virtual environment on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    pub path: PathBuf,
    pub python: PathBuf,
    pub pip: PathBuf,
}

impl RuntimeEnvironment {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            python: path.join("bin").join("python"),
            pip: path.join("bin").join("pip"),
            path,
        }
    }

    /// Whether `path` holds a usable virtual environment
    pub fn is_valid(&self) -> bool {
        self.path.join("pyvenv.cfg").is_file() && self.python.exists()
    }

    pub fn pip_conf(&self) -> PathBuf {
        self.path.join(PIP_CONF)
    }
}

/// `<python> -m venv <path>`
pub fn create_command(path: &Path, python: &str) -> Vec<String> {
    let path = path.display().to_string();
    argv([python, "-m", "venv", path.as_str()])
}

/// `<env>/bin/pip install --disable-pip-version-check [--extra-index-url URL] packages...`
pub fn pip_install_command(
    env: &RuntimeEnvironment,
    packages: &[String],
    extra_index_url: Option<&str>,
) -> Vec<String> {
    let mut command = argv([
        env.pip.display().to_string().as_str(),
        "install",
        "--disable-pip-version-check",
    ]);
    if let Some(url) = extra_index_url {
        command.push("--extra-index-url".to_string());
        command.push(url.to_string());
    }
    command.extend(packages.iter().cloned());
    command
}

/// Creates environments and installs packages through a [`CommandRunner`]
pub struct EnvironmentBuilder<'r> {
    runner: &'r dyn CommandRunner,
}

impl<'r> EnvironmentBuilder<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Create the environment at `path` unless a valid one is already there
    ///
    /// Returns the environment and whether anything on disk changed.
    pub fn create(
        &self,
        path: &Path,
        python: &str,
        index_url: Option<&str>,
    ) -> Result<(RuntimeEnvironment, bool)> {
        let env = RuntimeEnvironment::at(path);
        let mut changed = false;

        if env.is_valid() {
            tracing::debug!("Reusing Python environment at {}", path.display());
        } else {
            if has_entries(path)? {
                return Err(exec::environment_creation(
                    path.display().to_string(),
                    "the directory exists and is not a Python virtual environment",
                    "",
                ));
            }

            let command = create_command(path, python);
            let cmdline = join_cmdline(&command);
            let out = self.runner.run(&command).map_err(|e| match e {
                InstallerError::CommandSpawn { reason, .. } => {
                    exec::environment_creation(path.display().to_string(), reason, "")
                }
                other => other,
            })?;
            check_interrupted(&cmdline, &out)?;

            if !out.success() {
                return Err(exec::environment_creation(
                    path.display().to_string(),
                    format!("`{}` exited with {}", cmdline, out.status),
                    out.output,
                ));
            }
            if !env.is_valid() {
                return Err(exec::environment_creation(
                    path.display().to_string(),
                    format!("`{cmdline}` did not produce a virtual environment"),
                    out.output,
                ));
            }

            tracing::info!("Created Python environment at {}", path.display());
            changed = true;
        }

        changed |= write_pip_conf(&env, index_url)?;
        Ok((env, changed))
    }

    /// Install `packages` into `env`
    ///
    /// Returns whether pip installed anything. pip's output is attached to the
    /// error verbatim on failure.
    pub fn install(
        &self,
        env: &RuntimeEnvironment,
        packages: &[String],
        extra_index_url: Option<&str>,
    ) -> Result<bool> {
        if packages.is_empty() {
            return Ok(false);
        }

        let command = pip_install_command(env, packages, extra_index_url);
        let cmdline = join_cmdline(&command);
        let out = self.runner.run(&command)?;
        check_interrupted(&cmdline, &out)?;

        if !out.success() {
            return Err(exec::dependency_install(
                packages.to_vec(),
                cmdline,
                out.status.to_string(),
                out.output,
            ));
        }

        Ok(out.output.contains(PIP_INSTALLED))
    }
}

fn check_interrupted(cmdline: &str, out: &CommandOutput) -> Result<()> {
    if out.interrupted() {
        return Err(exec::interrupted(cmdline));
    }
    Ok(())
}

fn has_entries(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(path).map_err(|e| fs_error::read_failed(path, e))?;
    Ok(entries.next().is_some())
}

fn is_managed(path: &Path) -> bool {
    fs::read_to_string(path).is_ok_and(|content| content.starts_with(MANAGED_MARKER))
}

/// Point pip at `index_url`, or drop a pip.conf written by an earlier run
fn write_pip_conf(env: &RuntimeEnvironment, index_url: Option<&str>) -> Result<bool> {
    let path = env.pip_conf();

    let Some(url) = index_url else {
        if is_managed(&path) {
            fs::remove_file(&path).map_err(|e| fs_error::write_failed(&path, e))?;
            tracing::info!("Removed {}", path.display());
            return Ok(true);
        }
        return Ok(false);
    };

    let content = format!("{MANAGED_MARKER}\n[global]\nindex-url = {url}\n");
    if fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }
    if path.exists() && !is_managed(&path) {
        tracing::warn!("Replacing {} to use index {}", path.display(), url);
    }

    fs::write(&path, content).map_err(|e| fs_error::write_failed(&path, e))?;
    tracing::info!("Wrote {}", path.display());
    Ok(true)
}
