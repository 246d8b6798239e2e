//! Backend abstraction for apt operations.
//!
//! The [`Backend`] trait defines the interface for interacting with the
//! system package manager, allowing for different implementations (real
//! apt-get CLI, mock for testing).

pub mod apt;

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend trait for system package operations.
///
/// This trait abstracts the underlying package manager, enabling:
/// - Real CLI execution via `apt-get`/`dpkg-query`
/// - Mock implementations for testing
pub trait Backend: Send + Sync {
    /// Check if the package manager is available.
    fn is_available(&self) -> bool;

    /// Refresh the package index.
    fn update(&self) -> Result<()>;

    /// Install a package.
    fn install(&self, package: &str) -> Result<()>;

    /// Check if a package is installed.
    ///
    /// An unknown package is a normal `false` result, not an error.
    fn is_installed(&self, package: &str) -> Result<bool>;
}

/// Get the default backend (real apt-get CLI).
pub fn default_backend() -> Result<apt::AptBackend> {
    apt::AptBackend::new()
}

/// In-memory backend for tests.
///
/// Records every mutating call so tests can assert that a re-run of an
/// already-provisioned plan performs zero installs.
#[derive(Debug, Default)]
pub struct MockBackend {
    installed: Mutex<BTreeSet<String>>,
    install_calls: Mutex<Vec<String>>,
    update_calls: AtomicUsize,
    fail_install: Mutex<Option<String>>,
}

impl MockBackend {
    /// Create an empty mock with no packages installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that already has the given packages installed.
    pub fn with_installed(packages: &[&str]) -> Self {
        let backend = Self::new();
        {
            let mut installed = backend.installed.lock().unwrap();
            for package in packages {
                installed.insert((*package).to_string());
            }
        }
        backend
    }

    /// Make `install` fail for one specific package.
    pub fn fail_install_of(self, package: &str) -> Self {
        *self.fail_install.lock().unwrap() = Some(package.to_string());
        self
    }

    /// Packages passed to `install`, in call order.
    pub fn install_calls(&self) -> Vec<String> {
        self.install_calls.lock().unwrap().clone()
    }

    /// Number of times `update` was invoked.
    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

impl Backend for MockBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn update(&self) -> Result<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn install(&self, package: &str) -> Result<()> {
        self.install_calls.lock().unwrap().push(package.to_string());

        if self.fail_install.lock().unwrap().as_deref() == Some(package) {
            return Err(Error::InstallFailed {
                package: package.to_string(),
                stderr: "simulated failure".to_string(),
            });
        }

        self.installed.lock().unwrap().insert(package.to_string());
        Ok(())
    }

    fn is_installed(&self, package: &str) -> Result<bool> {
        Ok(self.installed.lock().unwrap().contains(package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_tracks_installs() {
        let mock = MockBackend::new();
        assert!(!mock.is_installed("curl").unwrap());

        mock.install("curl").unwrap();
        assert!(mock.is_installed("curl").unwrap());
        assert_eq!(mock.install_calls(), vec!["curl"]);
    }

    #[test]
    fn test_mock_with_installed() {
        let mock = MockBackend::with_installed(&["git", "curl"]);
        assert!(mock.is_installed("git").unwrap());
        assert!(mock.is_installed("curl").unwrap());
        assert!(!mock.is_installed("mysql-server").unwrap());
        assert!(mock.install_calls().is_empty());
    }

    #[test]
    fn test_mock_forced_failure() {
        let mock = MockBackend::new().fail_install_of("mysql-server");
        let err = mock.install("mysql-server").unwrap_err();
        assert!(matches!(err, Error::InstallFailed { package, .. } if package == "mysql-server"));
        assert!(!mock.is_installed("mysql-server").unwrap());
    }
}
