//! Plan building errors
//!
//! Every error here is raised before the executor runs, so the host is untouched.

use super::InstallerError;

/// Creates an error naming the required packages that have no translation
pub fn unsatisfiable(packages: Vec<String>, profile: impl Into<String>) -> InstallerError {
    InstallerError::UnsatisfiableRequirements {
        packages,
        profile: profile.into(),
    }
}

/// Creates an error for a canonical package missing from the catalog
pub fn not_catalogued(package: impl Into<String>, manager: impl Into<String>) -> InstallerError {
    InstallerError::PackageNotCatalogued {
        package: package.into(),
        manager: manager.into(),
    }
}

/// Creates an error for a mirror URL on a manager without repository support
pub fn repository_not_supported(manager: impl Into<String>) -> InstallerError {
    InstallerError::RepositoryNotSupported {
        manager: manager.into(),
    }
}

/// Creates an error for a feature id that is not in the feature catalog
pub fn unknown_feature(feature: impl Into<String>, available: &[&str]) -> InstallerError {
    InstallerError::UnknownFeature {
        feature: feature.into(),
        available: available.join(", "),
    }
}
