//! Errors raised while executing plan steps

use super::InstallerError;

/// Creates a failed step error
pub fn step_failed(
    command: impl Into<String>,
    status: impl Into<String>,
    output: impl Into<String>,
) -> InstallerError {
    InstallerError::StepFailed {
        command: command.into(),
        status: status.into(),
        output: output.into(),
    }
}

/// Creates an error for a program that could not be started
pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> InstallerError {
    InstallerError::CommandSpawn {
        command: command.into(),
        reason: reason.into(),
    }
}

/// Creates an interrupted error for a child killed by a signal
pub fn interrupted(command: impl Into<String>) -> InstallerError {
    InstallerError::Interrupted {
        command: command.into(),
    }
}

/// Creates a virtual environment creation error
pub fn environment_creation(
    path: impl Into<String>,
    reason: impl Into<String>,
    output: impl Into<String>,
) -> InstallerError {
    InstallerError::EnvironmentCreation {
        path: path.into(),
        reason: reason.into(),
        output: output.into(),
    }
}

/// Creates a Python dependency installation error carrying pip's output verbatim
pub fn dependency_install(
    packages: Vec<String>,
    command: impl Into<String>,
    status: impl Into<String>,
    output: impl Into<String>,
) -> InstallerError {
    InstallerError::DependencyInstall {
        packages,
        command: command.into(),
        status: status.into(),
        output: output.into(),
    }
}

/// Creates a site configuration error
pub fn site_configuration(reason: impl Into<String>) -> InstallerError {
    InstallerError::SiteConfiguration {
        reason: reason.into(),
    }
}
