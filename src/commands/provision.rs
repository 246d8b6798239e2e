//! Provision command - drives the full pipeline against the real host

use anyhow::{Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pipeline::{EventSink, StepOutcome};

use crate::Context;
use crate::config::{self, EnvVars, Manifest};
use crate::db::MysqlAdmin;
use crate::privilege;
use crate::service::Systemd;
use crate::steps::{Components, build_plan};
use crate::ui;
use crate::unit;

/// Sink emitting the timestamped run log, one line per event
struct LogSink;

impl EventSink for LogSink {
    fn on_step_start(&mut self, index: usize, total: usize, _name: &str, description: &str) {
        ui::event(&format!("[{index}/{total}] {description}"));
    }

    fn on_step_outcome(&mut self, name: &str, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Satisfied => ui::event(&format!("{name} already satisfied")),
            StepOutcome::Applied => ui::event(&format!("{name} applied")),
        }
    }

    fn on_step_failed(&mut self, name: &str, error: &anyhow::Error) {
        ui::event(&format!("{name} failed: {error:#}"));
    }
}

pub fn run(ctx: &Context, config_path: &Path, yes: bool) -> Result<()> {
    let manifest = Manifest::load(config_path)?;
    let base = config_base(config_path)?;
    let env = load_env(&manifest, &base)?;

    privilege::require_root("provision the host")?;

    let components = Components {
        packages: Arc::new(syspkg::backend::default_backend()?),
        runtime: Arc::new(runtimekit::NvmInstaller::new()),
        database: Arc::new(MysqlAdmin::new(manifest.database.clone())),
        services: Arc::new(Systemd::new()),
    };

    let user = unit::invoking_user();
    let plan = build_plan(&manifest, &base, &env, &components, &user);
    log::debug!("assembled plan with {} steps for user {user}", plan.len());

    if !ctx.quiet {
        ui::header("Provisioning plan");
        for (i, step) in plan.steps().iter().enumerate() {
            ui::kv(&format!("{:>2}", i + 1), &step.description());
        }
        println!();
    }

    if !yes && !confirm_proceed()? {
        ui::warn("Aborted");
        return Ok(());
    }

    let summary = pipeline::run(&plan, &mut LogSink)?;

    println!();
    ui::success(&format!(
        "Provisioning complete: {} applied, {} already satisfied",
        summary.applied, summary.satisfied
    ));

    Ok(())
}

/// Directory other manifest paths are resolved against
pub fn config_base(config_path: &Path) -> Result<PathBuf> {
    let canonical = config_path
        .canonicalize()
        .with_context(|| format!("Could not resolve {}", config_path.display()))?;
    Ok(canonical
        .parent()
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf))
}

/// Load the env file named by the manifest, if any
///
/// A configured-but-missing file is fatal; an unconfigured one just means
/// children get no extra environment.
pub fn load_env(manifest: &Manifest, base: &Path) -> Result<EnvVars> {
    match &manifest.host.env_file {
        Some(file) => {
            let path = config::resolve_dir(base, file);
            let env = config::load_env_file(&path)?;
            log::debug!("loaded {} variables from {}", env.len(), path.display());
            Ok(env)
        }
        None => Ok(EnvVars::new()),
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Provision this host?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}
