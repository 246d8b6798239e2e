//! Real apt backend using `apt-get` and `dpkg-query` commands.

use crate::backend::Backend;
use crate::error::{Error, Result};
use std::process::Command;

/// Backend that executes real `apt-get` commands.
pub struct AptBackend {
    /// Path to the apt-get executable
    apt_get: String,
}

impl AptBackend {
    /// Create a new AptBackend.
    ///
    /// Returns an error if apt-get is not installed.
    pub fn new() -> Result<Self> {
        let apt_get = find_apt_get()?;
        Ok(Self { apt_get })
    }

    /// Run apt-get with the noninteractive frontend and return output.
    fn run_apt(&self, args: &[&str]) -> Result<std::process::Output> {
        let output = Command::new(&self.apt_get)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute apt-get: {e}"),
            })?;
        Ok(output)
    }
}

impl Backend for AptBackend {
    fn is_available(&self) -> bool {
        self.run_apt(&["--version"])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn update(&self) -> Result<()> {
        let output = self.run_apt(&["update", "-y"])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::UpdateFailed {
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    fn install(&self, package: &str) -> Result<()> {
        let output = self.run_apt(&["install", "-y", package])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::InstallFailed {
                package: package.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    fn is_installed(&self, package: &str) -> Result<bool> {
        let output = Command::new("dpkg-query")
            .args(["-W", "-f=${Status}", package])
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute dpkg-query: {e}"),
            })?;

        // dpkg-query exits non-zero for packages it has never heard of
        if !output.status.success() {
            return Ok(false);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_dpkg_status(&stdout))
    }
}

/// Find the apt-get executable path.
fn find_apt_get() -> Result<String> {
    let paths = ["/usr/bin/apt-get", "/bin/apt-get"];

    for path in &paths {
        if std::path::Path::new(path).exists() {
            return Ok((*path).to_string());
        }
    }

    // Try which
    let output = Command::new("which")
        .arg("apt-get")
        .output()
        .map_err(|_| Error::AptNotFound)?;

    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Ok(path);
        }
    }

    Err(Error::AptNotFound)
}

/// Parse a dpkg status string like "install ok installed".
///
/// Removed-but-configured packages report "deinstall ok config-files" and
/// must not count as installed.
fn parse_dpkg_status(status: &str) -> bool {
    status.trim() == "install ok installed"
}
