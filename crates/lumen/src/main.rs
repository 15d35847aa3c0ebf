//! Lumen CLI - JPEG recompression and color palettes from the command line.
//!
//! Lumen reads JPEG or PNG images, re-encodes them as size-constrained JPEGs
//! and reports what each file saved. It can also derive a harmony palette
//! from an image's dominant color.
//!
//! # Usage
//!
//! ```bash
//! # Recompress a single image
//! lumen process photo.png --quality 80 --max-width 1600
//!
//! # Recompress a directory, streaming records as JSONL
//! lumen process ./photos/ --format jsonl --output results.jsonl --stats
//!
//! # Extract a palette
//! lumen palette photo.jpg
//!
//! # View configuration
//! lumen config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Lumen - JPEG recompression and color palette extraction.
#[derive(Parser, Debug)]
#[command(name = "lumen")]
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
    /// Recompress images to JPEG and report the savings
    Process(cli::process::ProcessArgs),

    /// Extract a harmony color palette from an image
    Palette(cli::palette::PaletteArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings use eprintln
    let config = match lumen_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `lumen config path`."
            );
            lumen_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Lumen v{}", lumen_core::VERSION);

    match cli.command {
        Commands::Process(args) => cli::process::execute(args, config).await,
        Commands::Palette(args) => cli::palette::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config).await,
    }
}
