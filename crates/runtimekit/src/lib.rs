//! # runtimekit
//!
//! Pure Rust library for resolving and installing pinned Node.js runtimes.
//!
//! This crate provides functionality for:
//! - Reading the required runtime version from a project manifest
//!   (`engines.node` in package.json), with a fixed fallback default
//! - Installing the nvm version manager on demand
//! - Installing and activating a specific Node.js version
//!
//! ## Resolution Semantics
//!
//! The version field has three meaningfully distinct shapes:
//!
//! | manifest                          | result                         |
//! |-----------------------------------|--------------------------------|
//! | no `engines.node` field           | fallback default ("16")        |
//! | `"engines": {"node": "18.17.0"}`  | "18.17.0"                      |
//! | `"engines": {"node": null}`       | error - configuration defect   |
//!
//! The null case never falls back: a field someone wrote and left null is
//! treated as a broken manifest, not an unpinned one.
//!
//! ## Example
//!
//! ```no_run
//! use runtimekit::{NvmInstaller, resolve_version};
//! use std::path::Path;
//!
//! let version = resolve_version(Path::new("backend/package.json")).unwrap();
//!
//! let installer = NvmInstaller::new();
//! if !installer.is_manager_installed() {
//!     installer.install_manager().unwrap();
//! }
//! if !installer.is_version_installed(&version).unwrap() {
//!     installer.install(&version).unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod nvm;
pub mod resolve;

pub use error::{Error, Result};
pub use nvm::{NVM_VERSION, NvmInstaller};
pub use resolve::{DEFAULT_VERSION, resolve_version};
