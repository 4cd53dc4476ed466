//! Error types and handling for rbinstall
//!
//! Uses `thiserror` for error definitions and `miette` for diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`host`]: Host fingerprinting and package manager selection errors
//! - [`plan`]: Plan building errors (raised before anything is mutated)
//! - [`index`]: Package index lookups
//! - [`exec`]: Errors raised while executing plan steps
//! - [`fs`]: File system errors

pub mod exec;
pub mod fs;
pub mod host;
pub mod index;
pub mod plan;

use miette::Diagnostic;
use thiserror::Error;

/// Exit code for installation failures
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when the host cannot be handled at all
pub const EXIT_UNSUPPORTED: i32 = 3;
/// Exit code when the plan cannot be satisfied (nothing was changed)
pub const EXIT_UNSATISFIABLE: i32 = 4;
/// Exit code for user abort or interrupt, matching the shell's SIGINT convention
pub const EXIT_ABORTED: i32 = 130;

/// Main error type for rbinstall operations
#[derive(Error, Diagnostic, Debug)]
pub enum InstallerError {
    // Host errors
    #[error("Unsupported platform: {reason}")]
    #[diagnostic(
        code(rbinstall::host::unsupported_platform),
        help("rbinstall supports Linux distributions with an os-release file, and macOS")
    )]
    UnsupportedPlatform { reason: String },

    #[error("No supported package manager for {profile}")]
    #[diagnostic(
        code(rbinstall::host::no_package_manager),
        help(
            "Supported systems: Debian 10+, Ubuntu 20.04+, CentOS Stream 9+, Fedora, RHEL 8+, \
             Rocky Linux 8+, AlmaLinux 8+, Amazon Linux 2/2023, Arch Linux, openSUSE, macOS with Homebrew"
        )
    )]
    NoPackageManager { profile: String },

    #[error("Package manager '{binary}' was not found on PATH")]
    #[diagnostic(
        code(rbinstall::host::manager_missing),
        help("Install {binary} or use --dry-run to inspect the plan")
    )]
    PackageManagerMissing { binary: String },

    // Plan errors
    #[error("Cannot install required packages on {profile}: {}", packages.join(", "))]
    #[diagnostic(
        code(rbinstall::plan::unsatisfiable),
        help("Nothing has been changed. These packages have no equivalent on this system")
    )]
    UnsatisfiableRequirements {
        packages: Vec<String>,
        profile: String,
    },

    #[error("Package '{package}' has no entry for the {manager} package manager")]
    #[diagnostic(code(rbinstall::plan::not_catalogued))]
    PackageNotCatalogued { package: String, manager: String },

    #[error("The {manager} package manager cannot add package repositories")]
    #[diagnostic(
        code(rbinstall::plan::repository_not_supported),
        help("Remove --system-repo-url, or configure the repository manually")
    )]
    RepositoryNotSupported { manager: String },

    #[error("Unknown feature: {feature}")]
    #[diagnostic(
        code(rbinstall::plan::unknown_feature),
        help("Available features: {available}")
    )]
    UnknownFeature { feature: String, available: String },

    // Package index errors
    #[error("Could not fetch release information for {package} from {url}: {reason}")]
    #[diagnostic(
        code(rbinstall::index::lookup_failed),
        help(
            "Check your network connection and the http_proxy and https_proxy environment variables, \
             or pass --skip-version-check to let pip choose the versions"
        )
    )]
    IndexLookup {
        package: String,
        url: String,
        reason: String,
    },

    #[error("No compatible version of {package} could be found for Python {python}")]
    #[diagnostic(
        code(rbinstall::index::no_compatible_release),
        help("You may need to install on a newer system with a newer version of Python")
    )]
    NoCompatibleRelease { package: String, python: String },

    // Execution errors
    #[error("Failed to create the Python environment at {path}: {reason}")]
    #[diagnostic(
        code(rbinstall::exec::environment_creation),
        help("Make sure the Python interpreter exists and includes the venv module")
    )]
    EnvironmentCreation {
        path: String,
        reason: String,
        output: String,
    },

    #[error("Failed to install Python packages ({}): `{command}` exited with {status}", packages.join(", "))]
    #[diagnostic(code(rbinstall::exec::dependency_install))]
    DependencyInstall {
        packages: Vec<String>,
        command: String,
        status: String,
        output: String,
    },

    #[error("Site configuration failed: {reason}")]
    #[diagnostic(code(rbinstall::exec::site_configuration))]
    SiteConfiguration { reason: String },

    #[error("Error executing `{command}`: {status}")]
    #[diagnostic(code(rbinstall::exec::step_failed))]
    StepFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Failed to run `{command}`: {reason}")]
    #[diagnostic(code(rbinstall::exec::spawn_failed))]
    CommandSpawn { command: String, reason: String },

    #[error("Interrupted while running `{command}`")]
    #[diagnostic(
        code(rbinstall::exec::interrupted),
        help("Re-run the installer to continue; completed steps are detected and skipped")
    )]
    Interrupted { command: String },

    #[error("Installation aborted")]
    #[diagnostic(code(rbinstall::exec::aborted))]
    Aborted,

    #[error("No terminal available for confirmation")]
    #[diagnostic(
        code(rbinstall::exec::non_interactive),
        help("Pass --noinput to run without prompting")
    )]
    NonInteractiveTerminal,

    #[error("No password was given for the site administrator")]
    #[diagnostic(
        code(rbinstall::exec::admin_password),
        help("Pass --admin-password, or run without --noinput to be prompted")
    )]
    MissingAdminPassword,

    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(rbinstall::cli::unknown_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnknownShell { shell: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(rbinstall::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(rbinstall::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(rbinstall::fs::io_error))]
    IoError { message: String },

    #[error("Failed to encode output: {message}")]
    #[diagnostic(code(rbinstall::fs::encode_failed))]
    EncodeFailed { message: String },
}

impl InstallerError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallerError::UnsupportedPlatform { .. }
            | InstallerError::NoPackageManager { .. }
            | InstallerError::PackageManagerMissing { .. } => EXIT_UNSUPPORTED,
            InstallerError::UnsatisfiableRequirements { .. }
            | InstallerError::PackageNotCatalogued { .. }
            | InstallerError::RepositoryNotSupported { .. }
            | InstallerError::UnknownFeature { .. }
            | InstallerError::NoCompatibleRelease { .. } => EXIT_UNSATISFIABLE,
            InstallerError::Interrupted { .. } | InstallerError::Aborted => EXIT_ABORTED,
            _ => EXIT_FAILURE,
        }
    }

    /// Captured command output attached to this error, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            InstallerError::EnvironmentCreation { output, .. }
            | InstallerError::DependencyInstall { output, .. }
            | InstallerError::StepFailed { output, .. } => Some(output.as_str()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InstallerError {
    fn from(err: std::io::Error) -> Self {
        InstallerError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for InstallerError {
    fn from(err: serde_json::Error) -> Self {
        InstallerError::EncodeFailed {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for InstallerError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationCanceled
            | inquire::InquireError::OperationInterrupted => InstallerError::Aborted,
            inquire::InquireError::NotTTY => InstallerError::NonInteractiveTerminal,
            other => InstallerError::IoError {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, InstallerError>;
