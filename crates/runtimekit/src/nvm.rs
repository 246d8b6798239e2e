//! nvm-backed runtime installation.
//!
//! The installer shells out to nvm through a bash child because nvm is a
//! sourced shell function, not a binary. All invocations are noninteractive
//! and export NVM_DIR explicitly so the orchestrator's own environment is
//! never mutated.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// nvm release installed when the manager is missing.
pub const NVM_VERSION: &str = "v0.39.7";

/// Installs and activates Node.js versions through nvm.
pub struct NvmInstaller {
    nvm_dir: PathBuf,
}

impl NvmInstaller {
    /// Create an installer rooted at `$NVM_DIR`, defaulting to `~/.nvm`.
    pub fn new() -> Self {
        let nvm_dir = std::env::var_os("NVM_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".nvm")))
            .unwrap_or_else(|| PathBuf::from("/root/.nvm"));
        Self { nvm_dir }
    }

    /// Create an installer rooted at an explicit directory (useful for tests).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            nvm_dir: dir.into(),
        }
    }

    /// The nvm root directory.
    pub fn nvm_dir(&self) -> &Path {
        &self.nvm_dir
    }

    fn nvm_script(&self) -> PathBuf {
        self.nvm_dir.join("nvm.sh")
    }

    /// Whether nvm itself is installed.
    pub fn is_manager_installed(&self) -> bool {
        self.nvm_script().exists()
    }

    /// Install nvm via its official install script.
    pub fn install_manager(&self) -> Result<()> {
        let url = format!(
            "https://raw.githubusercontent.com/nvm-sh/nvm/{NVM_VERSION}/install.sh"
        );
        let output = Command::new("bash")
            .args(["-c", &format!("curl -fsSL -o- {url} | bash")])
            .env("NVM_DIR", &self.nvm_dir)
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute nvm install script: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ManagerInstall {
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    /// Whether a Node version satisfying `version` is already installed.
    ///
    /// `version` may be a bare major ("16") or a full version ("16.20.2");
    /// installed versions live under `$NVM_DIR/versions/node/v<semver>`.
    pub fn is_version_installed(&self, version: &str) -> Result<bool> {
        let versions_dir = self.nvm_dir.join("versions").join("node");
        if !versions_dir.exists() {
            return Ok(false);
        }

        for entry in fs::read_dir(&versions_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if version_matches(&name, version) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Install a Node version and make it the default.
    pub fn install(&self, version: &str) -> Result<()> {
        let script = format!(
            "export NVM_DIR=\"{dir}\" && \\. \"$NVM_DIR/nvm.sh\" && \
             nvm install {version} && nvm alias default {version}",
            dir = self.nvm_dir.display(),
        );

        let output = Command::new("bash")
            .args(["-c", &script])
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute nvm: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::InstallFailed {
                version: version.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for NvmInstaller {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether an installed version directory satisfies a requested version.
fn version_matches(entry: &str, requested: &str) -> bool {
    let installed = entry.trim_start_matches('v');
    let requested = requested.trim_start_matches('v');

    installed == requested || installed.starts_with(&format!("{requested}."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_version_matches_major() {
        assert!(version_matches("v16.20.2", "16"));
        assert!(version_matches("v16.0.0", "16"));
        assert!(!version_matches("v18.17.0", "16"));
        // "1" must not match "16.x"
        assert!(!version_matches("v16.20.2", "1"));
    }

    #[test]
    fn test_version_matches_exact_and_minor() {
        assert!(version_matches("v16.20.2", "16.20.2"));
        assert!(version_matches("v16.20.2", "v16.20.2"));
        assert!(version_matches("v16.20.2", "16.20"));
        assert!(!version_matches("v16.2.0", "16.20"));
    }

    #[test]
    fn test_manager_detection() {
        let tmp = TempDir::new().unwrap();
        let installer = NvmInstaller::with_dir(tmp.path());

        assert!(!installer.is_manager_installed());

        std::fs::write(tmp.path().join("nvm.sh"), "# nvm").unwrap();
        assert!(installer.is_manager_installed());
    }

    #[test]
    fn test_is_version_installed() {
        let tmp = TempDir::new().unwrap();
        let installer = NvmInstaller::with_dir(tmp.path());

        // No versions directory at all
        assert!(!installer.is_version_installed("16").unwrap());

        let versions = tmp.path().join("versions").join("node");
        std::fs::create_dir_all(versions.join("v16.20.2")).unwrap();
        std::fs::create_dir_all(versions.join("v18.17.0")).unwrap();

        assert!(installer.is_version_installed("16").unwrap());
        assert!(installer.is_version_installed("16.20.2").unwrap());
        assert!(installer.is_version_installed("18").unwrap());
        assert!(!installer.is_version_installed("20").unwrap());
    }
}
