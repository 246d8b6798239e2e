//! Error types for runtime resolution and installation.

use std::io;
use std::path::PathBuf;

/// Result type alias for runtimekit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or installing a runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest declares the runtime version field but it is the null
    /// sentinel. This is a configuration defect, not a missing field, and
    /// deliberately does NOT fall back to the default version.
    #[error("engines.node is explicitly null in {manifest}; fix the manifest or remove the field")]
    VersionFieldNull {
        /// Manifest the defective field was read from.
        manifest: PathBuf,
    },

    /// The runtime version field exists but is not a string.
    #[error("engines.node in {manifest} is not a string (found {found})")]
    VersionFieldInvalid {
        /// Manifest the field was read from.
        manifest: PathBuf,
        /// JSON type name of the offending value.
        found: String,
    },

    /// Failed to read the manifest file.
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Installing the version manager itself failed.
    #[error("version manager install failed: {stderr}")]
    ManagerInstall {
        /// Standard error output from the install script.
        stderr: String,
    },

    /// `nvm install` exited non-zero.
    #[error("install failed for runtime version {version}: {stderr}")]
    InstallFailed {
        /// Requested runtime version.
        version: String,
        /// Standard error output from nvm.
        stderr: String,
    },

    /// Command could not be spawned at all.
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed.
        message: String,
    },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_field_null_display() {
        let err = Error::VersionFieldNull {
            manifest: PathBuf::from("/srv/app/package.json"),
        };
        let display = format!("{err}");
        assert!(display.contains("engines.node"));
        assert!(display.contains("/srv/app/package.json"));
    }

    #[test]
    fn test_install_failed_display_names_version() {
        let err = Error::InstallFailed {
            version: "16".to_string(),
            stderr: "download failed".to_string(),
        };
        assert!(format!("{err}").contains("16"));
    }
}
