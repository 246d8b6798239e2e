//! Service manager integration (systemd)
//!
//! The registrar's four mutations - write unit, reload daemon, enable,
//! start - each surface a distinct error and none is retried: systemctl
//! operations are fast and a failure means misconfiguration, not a blip.
//! Unit writes are idempotent at the content level so a re-run of an
//! unchanged manifest reloads nothing.

use std::io;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;

use crate::unit::ServiceUnit;

/// Where systemd looks for locally-administered units
const UNIT_DIR: &str = "/etc/systemd/system";

/// Errors from service registration
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Writing the unit file failed
    #[error("failed to write unit {unit}: {source}")]
    WriteUnit {
        unit: String,
        #[source]
        source: io::Error,
    },

    /// `systemctl daemon-reload` failed
    #[error("daemon reload failed: {stderr}")]
    DaemonReload {
        stderr: String,
    },

    /// `systemctl enable` failed
    #[error("enable failed for {unit}: {stderr}")]
    Enable {
        unit: String,
        stderr: String,
    },

    /// `systemctl start` failed
    #[error("start failed for {unit}: {stderr}")]
    Start {
        unit: String,
        stderr: String,
    },

    /// systemctl itself could not be spawned
    #[error("service manager unavailable: {message}")]
    Manager {
        message: String,
    },
}

/// Service manager seam
///
/// Mutations return typed errors; the probes (`is_active`, `is_enabled`,
/// `unit_current`) are infallible like every other idempotency predicate -
/// an unreachable manager reads as "not yet in the desired state".
pub trait ServiceManager: Send + Sync {
    /// Write the unit file; returns whether the on-disk content changed
    fn write_unit(&self, unit: &ServiceUnit) -> Result<bool, ServiceError>;

    /// Whether the on-disk unit file already matches the descriptor
    fn unit_current(&self, unit: &ServiceUnit) -> bool;

    /// Reload the manager's configuration
    fn daemon_reload(&self) -> Result<(), ServiceError>;

    /// Enable a unit for boot-start
    fn enable(&self, name: &str) -> Result<(), ServiceError>;

    /// Start a unit now
    fn start(&self, name: &str) -> Result<(), ServiceError>;

    /// Whether a unit is currently active
    fn is_active(&self, name: &str) -> bool;

    /// Whether a unit is enabled for boot-start
    fn is_enabled(&self, name: &str) -> bool;
}

/// Real systemd manager
pub struct Systemd {
    unit_dir: PathBuf,
}

impl Systemd {
    /// Manager writing to /etc/systemd/system
    pub fn new() -> Self {
        Self {
            unit_dir: PathBuf::from(UNIT_DIR),
        }
    }

    /// Manager writing to a custom unit directory (useful for tests)
    pub fn with_unit_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            unit_dir: dir.into(),
        }
    }

    fn unit_path(&self, unit: &ServiceUnit) -> PathBuf {
        self.unit_dir.join(unit.file_name())
    }

    fn systemctl(&self, args: &[&str]) -> Result<std::process::Output, ServiceError> {
        Command::new("systemctl")
            .args(args)
            .output()
            .map_err(|e| ServiceError::Manager {
                message: format!("failed to execute systemctl: {e}"),
            })
    }

    fn systemctl_status(&self, args: &[&str]) -> bool {
        self.systemctl(args)
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for Systemd {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager for Systemd {
    fn write_unit(&self, unit: &ServiceUnit) -> Result<bool, ServiceError> {
        let path = self.unit_path(unit);
        let rendered = unit.render();

        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == rendered) {
            return Ok(false);
        }

        std::fs::write(&path, rendered).map_err(|e| ServiceError::WriteUnit {
            unit: unit.name.clone(),
            source: e,
        })?;

        Ok(true)
    }

    fn unit_current(&self, unit: &ServiceUnit) -> bool {
        std::fs::read_to_string(self.unit_path(unit))
            .is_ok_and(|existing| existing == unit.render())
    }

    fn daemon_reload(&self) -> Result<(), ServiceError> {
        let output = self.systemctl(&["daemon-reload"])?;
        if !output.status.success() {
            return Err(ServiceError::DaemonReload {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn enable(&self, name: &str) -> Result<(), ServiceError> {
        let output = self.systemctl(&["enable", name])?;
        if !output.status.success() {
            return Err(ServiceError::Enable {
                unit: name.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn start(&self, name: &str) -> Result<(), ServiceError> {
        let output = self.systemctl(&["start", name])?;
        if !output.status.success() {
            return Err(ServiceError::Start {
                unit: name.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn is_active(&self, name: &str) -> bool {
        self.systemctl_status(&["is-active", "--quiet", name])
    }

    fn is_enabled(&self, name: &str) -> bool {
        self.systemctl_status(&["is-enabled", "--quiet", name])
    }
}
