//! Host fingerprinting
//!
//! [`detect`] builds the [`HostProfile`] once per run. Everything downstream
//! receives the profile by reference; nothing inspects the host again.

pub mod os_release;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Result, host as host_error};
use crate::process::{CommandRunner, argv};
use crate::version::Version;

/// Default locations of the os-release file, in lookup order
pub const OS_RELEASE_FILES: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];
/// Secondary distribution file
pub const LSB_RELEASE_FILE: &str = "/etc/lsb-release";
/// Interpreter used to create the runtime environment
pub const DEFAULT_PYTHON: &str = "python3";

const PYTHON_VERSION_SCRIPT: &str =
    "import sys; print('%d.%d.%d' % tuple(sys.version_info[:3]))";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    #[serde(rename = "macos")]
    MacOs,
}

impl OsFamily {
    /// Accepts Rust target names (`linux`, `macos`) and uname names (`Linux`, `Darwin`)
    pub fn parse(system: &str) -> Option<Self> {
        match system.to_lowercase().as_str() {
            "linux" => Some(OsFamily::Linux),
            "macos" | "darwin" | "osx" => Some(OsFamily::MacOs),
            _ => None,
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => f.write_str("Linux"),
            OsFamily::MacOs => f.write_str("macOS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    Other(String),
}

impl Arch {
    pub fn parse(machine: &str) -> Self {
        match machine.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Arch::X86_64,
            "aarch64" | "arm64" => Arch::Aarch64,
            other => Arch::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Other(name) => name,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Arch {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PythonInfo {
    pub executable: PathBuf,
    pub version: Version,
}

/// Immutable description of the host, computed once per run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostProfile {
    pub os_family: OsFamily,
    pub distro_id: String,
    pub distro_like: Vec<String>,
    pub distro_name: Option<String>,
    pub distro_version: Version,
    pub architecture: Arch,
    pub python: Option<PythonInfo>,
}

impl HostProfile {
    #[cfg(test)]
    pub fn linux(distro_id: &str, version: &str, architecture: Arch) -> Self {
        Self {
            os_family: OsFamily::Linux,
            distro_id: distro_id.to_string(),
            distro_like: Vec::new(),
            distro_name: None,
            distro_version: Version::parse(version),
            architecture,
            python: None,
        }
    }

    pub fn macos(version: &str, architecture: Arch) -> Self {
        Self {
            os_family: OsFamily::MacOs,
            distro_id: "macos".to_string(),
            distro_like: Vec::new(),
            distro_name: Some("macOS".to_string()),
            distro_version: Version::parse(version),
            architecture,
            python: None,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_like(mut self, like: &[&str]) -> Self {
        self.distro_like = like.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// The distribution id followed by every `ID_LIKE` entry
    pub fn families(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.distro_id.as_str()).chain(self.distro_like.iter().map(String::as_str))
    }
}

impl fmt::Display for HostProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.distro_name.as_deref().unwrap_or(&self.distro_id);
        if self.distro_version.is_empty() {
            write!(f, "{} ({})", name, self.architecture)
        } else {
            write!(f, "{} {} ({})", name, self.distro_version, self.architecture)
        }
    }
}

/// Inputs to fingerprinting; every field can be overridden from the command line
#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub system: Option<String>,
    pub arch: Option<String>,
    pub os_release_files: Vec<PathBuf>,
    pub lsb_release_file: PathBuf,
    pub python: String,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            system: None,
            arch: None,
            os_release_files: OS_RELEASE_FILES.iter().map(PathBuf::from).collect(),
            lsb_release_file: PathBuf::from(LSB_RELEASE_FILE),
            python: DEFAULT_PYTHON.to_string(),
        }
    }
}

/// Fingerprint the host
///
/// Read-only: the only commands run are `uname`, `sw_vers` and the Python
/// interpreter's version query.
pub fn detect(options: &DetectOptions, runner: &dyn CommandRunner) -> Result<HostProfile> {
    let system = options
        .system
        .clone()
        .unwrap_or_else(|| std::env::consts::OS.to_string());
    let os_family = OsFamily::parse(&system).ok_or_else(|| {
        host_error::unsupported(format!(
            "Review Board can only be installed on Linux or macOS with this installer (found {system})"
        ))
    })?;

    let architecture = Arch::parse(&detect_machine(options, runner));

    let mut profile = match os_family {
        OsFamily::Linux => {
            let info = os_release::read_distro_info(&options.os_release_files, &options.lsb_release_file)?
                .ok_or_else(|| {
                    host_error::unsupported(
                        "could not determine the Linux distribution (no os-release or lsb-release file)",
                    )
                })?;

            HostProfile {
                os_family,
                distro_id: info.id,
                distro_like: info.id_like,
                distro_name: info.pretty_name.or(info.name),
                distro_version: Version::parse(&info.version_id),
                architecture,
                python: None,
            }
        }
        OsFamily::MacOs => {
            let version = macos_version(runner).ok_or_else(|| {
                host_error::unsupported("this looks like macOS, but sw_vers did not report a version")
            })?;
            HostProfile::macos(&version, architecture)
        }
    };

    profile.python = detect_python(&options.python, runner);

    tracing::debug!(
        "Detected host: {} (families: {})",
        profile,
        profile.families().collect::<Vec<_>>().join(", ")
    );

    Ok(profile)
}

fn detect_machine(options: &DetectOptions, runner: &dyn CommandRunner) -> String {
    if let Some(arch) = &options.arch {
        return arch.clone();
    }

    match runner.run(&argv(["uname", "-m"])) {
        Ok(out) if out.success() && !out.output.trim().is_empty() => out.output.trim().to_string(),
        _ => {
            tracing::debug!("uname -m failed, using the build target architecture");
            std::env::consts::ARCH.to_string()
        }
    }
}

fn macos_version(runner: &dyn CommandRunner) -> Option<String> {
    let out = runner.run(&argv(["sw_vers", "-productVersion"])).ok()?;
    let version = out.output.trim();
    (out.success() && !version.is_empty()).then(|| version.to_string())
}

fn detect_python(python: &str, runner: &dyn CommandRunner) -> Option<PythonInfo> {
    let executable = which::which(python).unwrap_or_else(|_| PathBuf::from(python));

    match runner.run(&argv([python, "-c", PYTHON_VERSION_SCRIPT])) {
        Ok(out) if out.success() => Some(PythonInfo {
            executable,
            version: Version::parse(out.output.trim()),
        }),
        Ok(out) => {
            tracing::debug!("{} failed: {}", python, out.status);
            None
        }
        Err(e) => {
            tracing::debug!("{} is not available: {}", python, e);
            None
        }
    }
}
