//! Status command - predicate-only report, zero mutations

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use pipeline::StepState;

use crate::Context;
use crate::commands::provision::{config_base, load_env};
use crate::config::Manifest;
use crate::db::MysqlAdmin;
use crate::service::Systemd;
use crate::steps::{Components, build_plan};
use crate::ui;
use crate::unit;

pub fn run(ctx: &Context, config_path: &Path) -> Result<()> {
    let manifest = Manifest::load(config_path)?;
    let base = config_base(config_path)?;
    let env = load_env(&manifest, &base)?;

    let components = Components {
        packages: Arc::new(syspkg::backend::default_backend()?),
        runtime: Arc::new(runtimekit::NvmInstaller::new()),
        database: Arc::new(MysqlAdmin::new(manifest.database.clone())),
        services: Arc::new(Systemd::new()),
    };

    let plan = build_plan(&manifest, &base, &env, &components, &unit::invoking_user());
    let reports = pipeline::status(&plan);

    if !ctx.quiet {
        ui::header("Provisioning status");
    }

    let mut satisfied = 0;
    let mut pending = 0;
    let mut unknown = 0;

    for report in &reports {
        match &report.state {
            StepState::Satisfied => {
                satisfied += 1;
                println!("  {} {}", "✓".green(), report.description);
            }
            StepState::Pending => {
                pending += 1;
                println!("  {} {}", "○".dimmed(), report.description);
            }
            StepState::Unknown { error } => {
                unknown += 1;
                if ctx.verbose > 0 {
                    println!(
                        "  {} {} ({})",
                        "?".yellow(),
                        report.description,
                        error.dimmed()
                    );
                } else {
                    println!("  {} {}", "?".yellow(), report.description);
                }
            }
        }
    }

    println!();
    ui::info(&format!(
        "{satisfied} satisfied, {pending} pending, {unknown} unknown"
    ));

    if pending > 0 {
        ui::dim("Run 'stackup provision' to converge the host");
    }

    Ok(())
}
