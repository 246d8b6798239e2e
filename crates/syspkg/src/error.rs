//! Error types for apt operations.
//!
//! Every variant carries the context needed to report a failed install
//! without re-running anything: package installation is never retried,
//! a non-zero exit aborts the whole provisioning run.

use thiserror::Error;

/// Errors that can occur during apt operations.
#[derive(Debug, Error)]
pub enum Error {
    /// apt-get is not installed or not found in PATH
    #[error("apt-get not found; this host does not look like a Debian/Ubuntu system")]
    AptNotFound,

    /// `apt-get update` exited non-zero
    #[error("package index update failed: {stderr}")]
    UpdateFailed {
        /// Standard error output from apt-get
        stderr: String,
    },

    /// `apt-get install` exited non-zero for a package
    #[error("install failed for package {package}: {stderr}")]
    InstallFailed {
        /// Name of the package that failed to install
        package: String,
        /// Standard error output from apt-get
        stderr: String,
    },

    /// Command could not be spawned at all
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for apt operations.
pub type Result<T> = std::result::Result<T, Error>;
