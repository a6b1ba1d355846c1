//! barstream CLI - replay recorded bar feeds through the series engine.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;
mod feed;

use barstream_lib::OutputFormat;

#[derive(Parser)]
#[command(name = "barstream")]
#[command(about = "Streaming OHLCV series engine with Heikin-Ashi and Renko views", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress status output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured resolutions
    List {
        /// Show only tick-count resolutions
        #[arg(long)]
        ticks: bool,
    },

    /// Show details for one resolution
    Info {
        /// Resolution identifier (e.g., 500T, 30S, 15, 1D)
        resolution: String,
    },

    /// Replay a recorded history and live feed through a session
    Replay {
        /// Historical response file (JSON array, or object with `data`/`bars`)
        #[arg(long)]
        history: PathBuf,

        /// Live pushes to apply after the history (JSON array or NDJSON)
        #[arg(long)]
        live: Option<PathBuf>,

        /// Resolution identifier
        #[arg(short, long, default_value = "1")]
        resolution: String,

        /// Display mode (candlestick, heikin-ashi, renko)
        #[arg(short, long, default_value = "candlestick")]
        mode: String,

        /// Renko brick size, or `atr`
        #[arg(long)]
        brick_size: Option<String>,

        /// Output format (csv, tsv, json, ndjson). Defaults to the output
        /// extension, else csv.
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Output file path. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write every live update instead of the final series
        #[arg(long)]
        deltas: bool,

        /// Write the close-price line instead of candles or bricks
        #[arg(long, conflicts_with = "deltas")]
        close_line: bool,
    },
}

/// Installs the global subscriber; `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => tracing_subscriber::filter::LevelFilter::ERROR,
        (false, 0) => tracing_subscriber::filter::LevelFilter::WARN,
        (false, 1) => tracing_subscriber::filter::LevelFilter::INFO,
        (false, 2) => tracing_subscriber::filter::LevelFilter::DEBUG,
        (false, _) => tracing_subscriber::filter::LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        // Disable colours on release builds
        .with_ansi(cfg!(debug_assertions))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::List { ticks } => commands::list::list_resolutions(ticks),
        Commands::Info { resolution } => commands::info::show_info(&resolution),
        Commands::Replay {
            history,
            live,
            resolution,
            mode,
            brick_size,
            format,
            output,
            deltas,
            close_line,
        } => {
            let options = commands::replay::ReplayOptions {
                history,
                live,
                resolution,
                mode,
                brick_size,
                format,
                output,
                deltas,
                close_line,
                quiet: cli.quiet,
            };
            commands::replay::replay(options).await
        }
    }
}
