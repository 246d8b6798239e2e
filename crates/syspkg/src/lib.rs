//! # syspkg
//!
//! Pure Rust library for apt system package management.
//!
//! This crate provides functionality for:
//! - Checking whether a package is installed (dpkg status, no side effects)
//! - Refreshing the package index and installing packages noninteractively
//! - Substituting the real apt CLI with a mock backend in tests
//!
//! ## Example
//!
//! ```no_run
//! use syspkg::Client;
//!
//! // Create a client
//! let client = Client::new().expect("apt not available");
//!
//! // Install only what is missing
//! if !client.is_installed("mysql-server").unwrap() {
//!     client.update().unwrap();
//!     client.install("mysql-server").unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;

pub use backend::{Backend, MockBackend};
pub use error::{Error, Result};

use backend::apt::AptBackend;

/// High-level client for apt operations.
///
/// The client wraps a backend and provides the operations the provisioning
/// pipeline needs: an installed-check as the idempotency predicate and the
/// update+install sequence as the mutating action.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a new Client with the default backend.
    ///
    /// Returns an error if apt-get is not installed.
    pub fn new() -> Result<Self> {
        let backend = AptBackend::new()?;
        Ok(Self {
            backend: Box::new(backend),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Check if the package manager is available.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Refresh the package index.
    pub fn update(&self) -> Result<()> {
        self.backend.update()
    }

    /// Install a package.
    pub fn install(&self, package: &str) -> Result<()> {
        self.backend.install(package)
    }

    /// Check if a package is installed.
    pub fn is_installed(&self, package: &str) -> Result<bool> {
        self.backend.is_installed(package)
    }
}
