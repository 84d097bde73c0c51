//! CareLens CLI - healthcare AI service with chest X-ray intake screening.
//!
//! Serves the symptom predictor, the chest X-ray analyzer and the medical
//! assistant over HTTP, and exposes the X-ray validator for offline use.
//!
//! # Usage
//!
//! ```bash
//! # Start the API server
//! carelens serve --port 8000
//!
//! # Check whether files would pass the X-ray intake validator
//! carelens validate scan1.png scan2.jpg
//!
//! # View configuration
//! carelens config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// CareLens - symptom prediction, chest X-ray screening and a medical assistant.
#[derive(Parser, Debug)]
#[command(name = "carelens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API server
    Serve(cli::serve::ServeArgs),

    /// Run the X-ray intake validator on image files
    Validate(cli::validate::ValidateArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match carelens_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `carelens config path`."
            );
            carelens_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("CareLens v{}", carelens_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Validate(args) => cli::validate::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
