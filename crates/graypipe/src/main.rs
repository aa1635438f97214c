//! graypipe CLI - concurrent load → resize → grayscale → save pipeline.
//!
//! Every source image is decoded, resized to 500×500, converted to grayscale
//! and written as JPEG under the output directory. Each stage runs as its own
//! task; a two-line timing/memory report is written at the end of the run.
//!
//! # Usage
//!
//! ```bash
//! # Process the sources listed in the config file
//! graypipe run
//!
//! # Process explicit sources, continuing past bad images
//! graypipe run images/a.jpeg images/b.jpeg --keep-going
//!
//! # View configuration
//! graypipe config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use graypipe_core::{Config, CountingAllocator};

mod cli;
mod logging;

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// graypipe - concurrent image pipeline: load, resize, grayscale, save.
#[derive(Parser, Debug)]
#[command(name = "graypipe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "GRAYPIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Telemetry log file (overrides logging.file)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline over a list of images
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => match Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `graypipe config path`."
                );
                Config::default()
            }
        },
    };

    let log_file = cli.log_file.clone().or_else(|| config.log_file());
    logging::init_from_config(&config, cli.verbose, cli.json_logs, log_file.as_deref())?;

    tracing::info!("Application has started");
    tracing::debug!("graypipe v{}", graypipe_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
