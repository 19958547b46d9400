//! Scaffold preview CLI
//!
//! Creates preview sessions from JSON request files and prints the resulting
//! session or its fidelity checklist.
//!
//! ```bash
//! scaffold-preview create request.json --navigate /pricing
//! scaffold-preview score request.json
//! ```

mod args;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up PREVIEW_* and UPSTASH_* settings from a local .env
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG wins unless --verbose is passed
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config_file.as_deref())?;

    match cli.command {
        Commands::Create {
            request,
            navigate,
            auth,
        } => commands::create::execute(&config, &request, &navigate, auth.as_deref()).await,
        Commands::Score { request, json } => commands::score::execute(&config, &request, json),
        Commands::Config => commands::show_config(&config),
    }
}
