//! Host fingerprinting and package manager selection errors

use super::InstallerError;

/// Creates an unsupported platform error
pub fn unsupported(reason: impl Into<String>) -> InstallerError {
    InstallerError::UnsupportedPlatform {
        reason: reason.into(),
    }
}

/// Creates an error for a host no package manager entry matches
pub fn no_package_manager(profile: impl Into<String>) -> InstallerError {
    InstallerError::NoPackageManager {
        profile: profile.into(),
    }
}

/// Creates an error for a selected package manager whose binary is missing
pub fn manager_missing(binary: impl Into<String>) -> InstallerError {
    InstallerError::PackageManagerMissing {
        binary: binary.into(),
    }
}
