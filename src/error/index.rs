//! Package index lookup errors

use super::InstallerError;

/// Creates an error for a failed or unreadable index response
pub fn lookup_failed(
    package: impl Into<String>,
    url: impl Into<String>,
    reason: impl ToString,
) -> InstallerError {
    InstallerError::IndexLookup {
        package: package.into(),
        url: url.into(),
        reason: reason.to_string(),
    }
}

/// Creates an error for a package with no release the host Python can run
pub fn no_compatible_release(package: impl Into<String>, python: impl Into<String>) -> InstallerError {
    InstallerError::NoCompatibleRelease {
        package: package.into(),
        python: python.into(),
    }
}
