//! Effective-uid gate for mutating commands
//!
//! Provisioning touches apt, /etc/systemd and the database server, all of
//! which require root. The check runs once up front so a run fails before
//! the first step instead of halfway through.

use anyhow::{Result, bail};

/// Whether the process is running with effective uid 0
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

/// Refuse to continue unless running as root
pub fn require_root(action: &str) -> Result<()> {
    if !is_root() {
        bail!("root privileges are required to {action}; re-run with sudo");
    }
    Ok(())
}
