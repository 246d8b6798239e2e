use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackup")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Provision a host from a declarative manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full provisioning pipeline against this host
    Provision(ProvisionArgs),

    /// Show which steps are already satisfied, without changing anything
    Status(StatusArgs),

    /// Check which external tools the pipeline can reach
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ProvisionArgs {
    /// Path to the provisioning manifest
    #[arg(short, long, default_value = "stackup.toml")]
    pub config: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Path to the provisioning manifest
    #[arg(short, long, default_value = "stackup.toml")]
    pub config: PathBuf,
}
