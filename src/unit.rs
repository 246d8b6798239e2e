//! Service descriptor rendering for systemd units
//!
//! The builder here is the single source of truth for unit names and
//! contents: every long-running process the pipeline registers is declared
//! in the manifest and rendered through [`ServiceUnit::render`]. Nothing
//! else in the codebase hardcodes a unit name.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config::{Manifest, resolve_dir};

/// PATH baked into generated units so commands resolve without a login shell
const UNIT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Execution type of a registered process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// Runs to completion once (e.g., a frontend build)
    Oneshot,
    /// Long-running process supervised by the service manager
    #[default]
    Daemon,
}

/// Restart policy for a registered process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// Restart whenever the process exits
    #[default]
    Always,
    /// Restart only on non-zero exit
    OnFailure,
    /// Never restart
    No,
}

impl RestartPolicy {
    fn as_systemd(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::OnFailure => "on-failure",
            Self::No => "no",
        }
    }
}

/// A declarative service descriptor
///
/// Describes how one process should be launched, supervised, and restarted
/// by the host's service manager. Built from the manifest; consumed by the
/// registrar; persists as host state until explicitly replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub name: String,
    pub description: String,
    pub command: String,
    pub working_dir: PathBuf,
    pub user: String,
    pub env: Vec<(String, String)>,
    pub kind: UnitKind,
    pub restart: RestartPolicy,
    pub enable: bool,
}

impl ServiceUnit {
    /// File name of the unit under the service manager's configuration dir
    pub fn file_name(&self) -> String {
        format!("{}.service", self.name)
    }

    /// Render the systemd unit text
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("[Unit]\n");
        out.push_str(&format!("Description={}\n", self.description));
        out.push_str("After=network.target\n");
        out.push('\n');

        out.push_str("[Service]\n");
        match self.kind {
            UnitKind::Oneshot => {
                out.push_str("Type=oneshot\n");
                out.push_str("RemainAfterExit=yes\n");
            }
            UnitKind::Daemon => {
                out.push_str("Type=simple\n");
            }
        }
        out.push_str(&format!("User={}\n", self.user));
        out.push_str(&format!(
            "WorkingDirectory={}\n",
            self.working_dir.display()
        ));
        out.push_str(&format!("Environment=PATH={UNIT_PATH}\n"));
        out.push_str("Environment=NODE_ENV=production\n");
        for (key, value) in &self.env {
            out.push_str(&format!("Environment={key}={value}\n"));
        }
        out.push_str(&format!(
            "ExecStart=/bin/bash -lc '{}'\n",
            shell_escape(&self.command)
        ));
        if self.kind == UnitKind::Daemon {
            out.push_str(&format!("Restart={}\n", self.restart.as_systemd()));
            out.push_str("RestartSec=3\n");
        }
        out.push('\n');

        out.push_str("[Install]\n");
        out.push_str("WantedBy=multi-user.target\n");

        out
    }
}

/// Build one descriptor per manifest service entry
///
/// Pure: resolves working directories against the manifest location and
/// stamps the invoking user, but touches nothing on the host.
pub fn build_units(manifest: &Manifest, base: &Path, user: &str) -> Vec<ServiceUnit> {
    manifest
        .services
        .iter()
        .map(|svc| ServiceUnit {
            name: svc.name.clone(),
            description: svc
                .description
                .clone()
                .unwrap_or_else(|| format!("{} (managed by stackup)", svc.name)),
            command: svc.command.clone(),
            working_dir: resolve_dir(base, &svc.dir),
            user: user.to_string(),
            env: svc.env.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            kind: svc.kind,
            restart: svc.restart,
            enable: svc.enable,
        })
        .collect()
}

/// Identity of the invoking user, for the User= line
pub fn invoking_user() -> String {
    std::env::var("SUDO_USER")
        .or_else(|_| std::env::var("USER"))
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

/// Escape single quotes for embedding in a single-quoted bash string
fn shell_escape(command: &str) -> String {
    command.replace('\'', r"'\''")
}
