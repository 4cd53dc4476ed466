//! File system errors

use std::path::Path;

use super::InstallerError;

/// Creates a read failure for `path`
pub fn read_failed(path: &Path, reason: impl ToString) -> InstallerError {
    InstallerError::FileReadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a write failure for `path`
pub fn write_failed(path: &Path, reason: impl ToString) -> InstallerError {
    InstallerError::FileWriteFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
