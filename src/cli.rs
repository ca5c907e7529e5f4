use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "imfconv")]
#[command(author, version, about = "Declarative conversion-pipeline interpreter for media compositions")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a conversion pipeline against a composition timeline
    Run {
        /// Pipeline description file (JSON)
        #[arg(long, required = true)]
        pipeline: PathBuf,

        /// Composition timeline file (JSON)
        #[arg(long)]
        timeline: Option<PathBuf>,

        /// Log resolved commands without spawning any process
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that configured external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
