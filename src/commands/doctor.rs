//! Doctor command - host capability checks

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::privilege;
use crate::probe::{CapabilityProbe, CommandProbe};
use crate::ui;

/// Tools the pipeline shells out to, with what each one is needed for
const TOOLS: &[(&str, &str)] = &[
    ("apt-get", "system package installs"),
    ("dpkg-query", "package status probes"),
    ("systemctl", "service registration"),
    ("mysql", "database provisioning"),
    ("bash", "step execution"),
    ("curl", "version manager bootstrap"),
    ("node", "application runtime (installed by the pipeline)"),
    ("npm", "dependency installs (installed by the pipeline)"),
];

pub fn run(ctx: &Context) -> Result<()> {
    run_with_probe(ctx, &CommandProbe)?;

    // PATH probes only prove the binary exists; ask the backend itself
    match syspkg::Client::new() {
        Ok(client) if client.is_available() => {
            ui::success("Package backend responding (apt-get --version)");
        }
        Ok(_) => ui::warn("apt-get found but not responding"),
        Err(e) => ui::warn(&format!("Package backend unavailable: {e}")),
    }

    Ok(())
}

fn run_with_probe(ctx: &Context, probe: &dyn CapabilityProbe) -> Result<()> {
    if !ctx.quiet {
        ui::header("Host capabilities");
    }

    let mut missing = 0;
    for (tool, purpose) in TOOLS {
        if probe.probe(tool) {
            println!("  {} {:<12} {}", "✓".green(), tool, purpose.dimmed());
        } else {
            missing += 1;
            println!("  {} {:<12} {}", "✗".red(), tool, purpose.dimmed());
        }
    }

    println!();
    if privilege::is_root() {
        ui::info("Running as root; provisioning can mutate this host");
    } else {
        ui::warn("Not running as root; 'stackup provision' will refuse to run");
    }

    if missing > 0 {
        ui::warn(&format!(
            "{missing} tool(s) missing; some may be installed by the pipeline itself"
        ));
    } else {
        ui::success("All tools present");
    }

    Ok(())
}
