//! Per-project dependency installation
//!
//! Runs the project's install command (npm by default) inside the project
//! directory with the loaded env file in the child environment. No
//! idempotency probe of its own: the installer converges on re-run, and a
//! missing directory or non-zero exit aborts the pipeline.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

use crate::config::EnvVars;

/// Errors from dependency installation
#[derive(Debug, Error)]
pub enum DepsError {
    /// The configured project directory does not exist
    #[error("project directory not found: {dir}")]
    DirectoryNotFound {
        dir: PathBuf,
    },

    /// The install command exited non-zero
    #[error("dependency install failed in {dir}: {stderr}")]
    InstallFailed {
        dir: PathBuf,
        stderr: String,
    },

    /// The install command could not be spawned
    #[error("failed to run install command in {dir}: {message}")]
    Spawn {
        dir: PathBuf,
        message: String,
    },
}

/// Installs project dependencies with a fixed child environment
pub struct DependencyInstaller {
    env: EnvVars,
}

impl DependencyInstaller {
    /// Installer passing the given env file variables to every child
    pub fn new(env: EnvVars) -> Self {
        Self { env }
    }

    /// Run `command` inside `dir`
    pub fn install(&self, dir: &Path, command: &str) -> Result<(), DepsError> {
        if !dir.is_dir() {
            return Err(DepsError::DirectoryNotFound {
                dir: dir.to_path_buf(),
            });
        }

        let output = Command::new("bash")
            .args(["-lc", command])
            .current_dir(dir)
            .envs(&self.env)
            .output()
            .map_err(|e| DepsError::Spawn {
                dir: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DepsError::InstallFailed {
                dir: dir.to_path_buf(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}
