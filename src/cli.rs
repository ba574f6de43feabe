// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cutover")]
#[command(about = "Release orchestrator for containerized services")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new cutover.yml configuration file
    Init {
        /// Service name
        #[arg(short, long)]
        service: Option<String>,

        /// Artifact repository, e.g. registry.example.com/app
        #[arg(short, long)]
        repository: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy a source revision to an environment
    Deploy {
        /// Target environment (defined in config)
        #[arg(short, long)]
        environment: String,

        /// Source revision to deploy (defaults to $CUTOVER_REVISION)
        #[arg(short, long)]
        revision: Option<String>,
    },

    /// Roll back an environment to its previous release
    Rollback {
        /// Target environment (defined in config)
        #[arg(short, long)]
        environment: String,
    },

    /// Show environment pointers and recent releases
    Status {
        /// Limit to one environment
        #[arg(short, long)]
        environment: Option<String>,
    },
}
