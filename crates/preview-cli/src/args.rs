//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scaffold-preview")]
#[command(about = "Preview sessions for generated web-project scaffolds")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, env = "PREVIEW_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a session from a request file and print it as JSON
    Create {
        /// JSON file with the session request
        request: PathBuf,

        /// Navigate to these paths in order after creation
        #[arg(long, value_name = "PATH")]
        navigate: Vec<String>,

        /// Simulated auth state to switch to after navigating
        #[arg(long, value_name = "STATE")]
        auth: Option<String>,
    },

    /// Print the fidelity checklist for a request file
    Score {
        /// JSON file with the session request
        request: PathBuf,

        /// Emit the report as JSON instead of a checklist
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}
