mod cli;
mod commands;
mod config;
mod db;
mod deps;
mod migrate;
mod privilege;
mod probe;
mod readiness;
mod service;
mod steps;
mod ui;
mod unit;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use std::io;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Provision(args) => commands::provision::run(&ctx, &args.config, args.yes),
        Commands::Status(args) => commands::status::run(&ctx, &args.config),
        Commands::Doctor => commands::doctor::run(&ctx),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "stackup", &mut io::stdout());
            Ok(())
        }
    }
}
